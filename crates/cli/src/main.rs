//! Lorry Desk CLI - offline quoting, repricing, reporting and CSV tools.
//!
//! # Usage
//!
//! ```bash
//! # Price a consignment
//! ld-cli quote --quantity 2 --freight 50 --loading 10 --unloading 10
//!
//! # Preview a 10% rate rise, then write the repriced catalog
//! ld-cli reprice seed.yaml --percent 10
//! ld-cli reprice seed.yaml --percent 10 --apply articles.csv
//!
//! # Dashboard figures from a fixture
//! ld-cli report daily seed.yaml --days 30
//! ld-cli report summary seed.yaml --json
//!
//! # CSV transfer
//! ld-cli export bookings seed.yaml bookings.csv --status booked
//! ld-cli import articles new-articles.csv --branch br-mum
//! ```
//!
//! Fixture files use the same JSON/YAML layout the admin server loads from
//! `LD_SEED_FILE`. Calendar days follow `LD_UTC_OFFSET_MINUTES`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use lorry_desk_core::filter::{ArticleFilter, BookingFilter, DateRange, DateRangePreset};
use lorry_desk_core::pricing::{Charges, RateAdjustment};
use lorry_desk_core::{BookingStatus, BranchId, PaymentType};

use commands::report::Report;
use commands::{CliError, Dataset};

mod commands;

#[derive(Parser)]
#[command(name = "ld-cli")]
#[command(author, version, about = "Lorry Desk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a consignment without booking it
    Quote(QuoteArgs),
    /// Preview or apply a bulk rate adjustment
    Reprice(RepriceArgs),
    /// Print dashboard figures for a fixture
    Report {
        #[command(subcommand)]
        report: ReportCommand,
    },
    /// Write fixture records as CSV
    Export {
        #[command(subcommand)]
        target: ExportTarget,
    },
    /// Check (and optionally load) a CSV file
    Import {
        #[command(subcommand)]
        target: ImportTarget,
    },
}

#[derive(Args)]
struct QuoteArgs {
    /// Number of units
    #[arg(short, long)]
    quantity: u32,
    /// Freight per unit
    #[arg(short, long)]
    freight: Decimal,
    #[arg(long)]
    loading: Option<Decimal>,
    #[arg(long)]
    unloading: Option<Decimal>,
    #[arg(long)]
    insurance: Option<Decimal>,
    #[arg(long)]
    packaging: Option<Decimal>,
}

#[derive(Args)]
struct RepriceArgs {
    /// Seed fixture holding the catalog
    seed: PathBuf,
    #[command(flatten)]
    adjustment: AdjustmentArgs,
    /// Only articles whose name, description or HSN code contains this text
    #[arg(long)]
    search: Option<String>,
    /// Only articles owned by this branch
    #[arg(long)]
    branch: Option<String>,
    /// Apply the adjustment and write the repriced catalog to this CSV
    #[arg(long, value_name = "OUT_CSV")]
    apply: Option<PathBuf>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct AdjustmentArgs {
    /// Percentage change, e.g. 10 or -5
    #[arg(long, allow_hyphen_values = true)]
    percent: Option<Decimal>,
    /// Amount added to every rate, e.g. 25 or -10
    #[arg(long, allow_hyphen_values = true)]
    fixed: Option<Decimal>,
}

#[derive(Args)]
struct ReportArgs {
    /// Seed fixture holding the bookings
    seed: PathBuf,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Headline figures
    Summary(ReportArgs),
    /// Bookings per day, ending today
    Daily {
        #[command(flatten)]
        args: ReportArgs,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Bookings per month, ending this month
    Monthly {
        #[command(flatten)]
        args: ReportArgs,
        #[arg(long, default_value_t = 6)]
        months: u32,
    },
    /// Bookings per status
    Status(ReportArgs),
    /// Revenue per origin branch
    Branches(ReportArgs),
    /// Revenue per payment type
    PaymentTypes(ReportArgs),
}

#[derive(Subcommand)]
enum ExportTarget {
    /// Booking register, newest first
    Bookings {
        seed: PathBuf,
        out: PathBuf,
        #[arg(long)]
        search: Option<String>,
        /// `booked`, `in_transit`, `delivered` or `cancelled`
        #[arg(long)]
        status: Option<BookingStatus>,
        /// `Paid`, `To Pay` or `Quotation`
        #[arg(long)]
        payment_type: Option<PaymentType>,
        /// `today`, `yesterday`, `last_week`, `last_month` or `last_3_months`
        #[arg(long)]
        range: Option<DateRangePreset>,
        #[arg(long)]
        branch: Option<String>,
    },
    /// Article catalog, by name
    Articles { seed: PathBuf, out: PathBuf },
}

#[derive(Subcommand)]
enum ImportTarget {
    /// Validate an article CSV for a branch
    Articles {
        csv: PathBuf,
        #[arg(long)]
        branch: String,
        /// Also import into an in-memory copy of this fixture
        #[arg(long)]
        seed: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so command output can be piped.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Quote(args) => {
            let charges = Charges {
                loading_charges: args.loading,
                unloading_charges: args.unloading,
                insurance_charge: args.insurance,
                packaging_charge: args.packaging,
                ..Charges::new(args.quantity, args.freight)
            };
            commands::quote::run(&mut out, &charges)?;
        }
        Commands::Reprice(args) => {
            let data = Dataset::load(&args.seed)?;
            let adjustment = adjustment(&args.adjustment)?;
            let filter = ArticleFilter {
                search: args.search,
                branch: args.branch.map(BranchId::new),
            };
            commands::reprice::run(&mut out, &data, &filter, adjustment, args.apply.as_deref())
                .await?;
        }
        Commands::Report { report } => {
            let (args, report) = match report {
                ReportCommand::Summary(args) => (args, Report::Summary),
                ReportCommand::Daily { args, days } => (args, Report::Daily { days }),
                ReportCommand::Monthly { args, months } => (args, Report::Monthly { months }),
                ReportCommand::Status(args) => (args, Report::Status),
                ReportCommand::Branches(args) => (args, Report::Branches),
                ReportCommand::PaymentTypes(args) => (args, Report::PaymentTypes),
            };
            let data = Dataset::load(&args.seed)?;
            commands::report::run(&mut out, &data, report, args.json).await?;
        }
        Commands::Export { target } => match target {
            ExportTarget::Bookings {
                seed,
                out: path,
                search,
                status,
                payment_type,
                range,
                branch,
            } => {
                let data = Dataset::load(&seed)?;
                let filter = BookingFilter {
                    search,
                    date_range: range.map(DateRange::preset).unwrap_or_default(),
                    status,
                    payment_type,
                    branch: branch.map(BranchId::new),
                };
                let rows = commands::export::bookings(&data, &filter, &path).await?;
                writeln!(out, "{rows} booking(s) written to {}", path.display())?;
            }
            ExportTarget::Articles { seed, out: path } => {
                let data = Dataset::load(&seed)?;
                let rows = commands::export::articles(&data, &path).await?;
                writeln!(out, "{rows} article(s) written to {}", path.display())?;
            }
        },
        Commands::Import { target } => match target {
            ImportTarget::Articles { csv, branch, seed } => {
                let data = seed.as_deref().map(Dataset::load).transpose()?;
                let rows = commands::import::articles(
                    &mut out,
                    &csv,
                    &BranchId::new(branch),
                    data.as_ref(),
                )
                .await?;
                writeln!(out, "{rows} article(s) accepted")?;
            }
        },
    }
    Ok(())
}

fn adjustment(args: &AdjustmentArgs) -> Result<RateAdjustment, CliError> {
    match (args.percent, args.fixed) {
        (Some(value), None) => Ok(RateAdjustment::percentage(value)),
        (None, Some(value)) => Ok(RateAdjustment::fixed(value)),
        _ => Err(CliError::Invalid(
            "exactly one of --percent or --fixed is required".to_string(),
        )),
    }
}
