//! Server settings read from `LD_*` and `SENTRY_*` variables.
//!
//! Required:
//! - `LD_ORGANIZATION_ID` - Organization whose records this instance serves
//!
//! Optional:
//! - `LD_HOST` - Bind address (default: 127.0.0.1)
//! - `LD_PORT` - Listen port (default: 3001)
//! - `LD_BRANCH_ID` - Acting branch for requests that do not name one
//! - `LD_UTC_OFFSET_MINUTES` - Offset used for calendar days (default: 330, IST)
//! - `LD_SEED_FILE` - JSON or YAML fixture loaded into the memory store
//! - `LD_DEFAULT_PAGE_SIZE` - List page size (default: 25, max 200)
//! - `LD_LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - enables error reporting when set and non-empty
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;

use lorry_desk_core::{BranchId, OrganizationId};

const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;
const MIN_UTC_OFFSET_MINUTES: i32 = -720;
const MAX_UTC_OFFSET_MINUTES: i32 = 840;
const DEFAULT_PAGE_SIZE: usize = 25;
const MAX_PAGE_SIZE: usize = 200;

/// Why the server could not start from the current environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Settings for one `lorry-desk-admin` process.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Organization served by this instance
    pub organization_id: OrganizationId,
    /// Acting branch when a request does not name one
    pub default_branch_id: Option<BranchId>,
    /// Offset used to decide calendar days
    pub utc_offset: FixedOffset,
    /// Fixture loaded into the memory store at startup
    pub seed_file: Option<PathBuf>,
    /// Rows per page when a list request does not say
    pub default_page_size: usize,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    /// Error reporting is off when this is `None`
    pub sentry_dsn: Option<String>,
    /// Tag attached to every reported event
    pub sentry_environment: Option<String>,
    /// Fraction of errors reported, clamped to `0.0..=1.0`
    pub sentry_sample_rate: f32,
    /// Fraction of requests traced, clamped to `0.0..=1.0`
    pub sentry_traces_sample_rate: f32,
}

impl AdminConfig {
    /// Reads the process environment after merging a `.env` file, if any.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is normal in production.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env
            .or_default("LD_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("LD_HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("LD_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("LD_PORT".to_string(), e.to_string()))?;

        let organization_id = env
            .optional("LD_ORGANIZATION_ID")
            .filter(|v| !v.trim().is_empty())
            .map(OrganizationId::new)
            .ok_or_else(|| ConfigError::MissingEnvVar("LD_ORGANIZATION_ID".to_string()))?;
        let default_branch_id = env
            .optional("LD_BRANCH_ID")
            .filter(|v| !v.trim().is_empty())
            .map(BranchId::new);

        let utc_offset = parse_utc_offset(env.optional("LD_UTC_OFFSET_MINUTES").as_deref())?;
        let seed_file = env.optional("LD_SEED_FILE").map(PathBuf::from);
        let default_page_size = parse_page_size(env.optional("LD_DEFAULT_PAGE_SIZE").as_deref())?;
        let log_json = env
            .optional("LD_LOG_FORMAT")
            .is_some_and(|v| v.eq_ignore_ascii_case("json"));

        let sentry_dsn = env.optional("SENTRY_DSN").filter(|v| !v.is_empty());
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env.rate("SENTRY_SAMPLE_RATE", 1.0);
        let sentry_traces_sample_rate = env.rate("SENTRY_TRACES_SAMPLE_RATE", 0.1);

        Ok(Self {
            host,
            port,
            organization_id,
            default_branch_id,
            utc_offset,
            seed_file,
            default_page_size,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Where the listener binds.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// A configuration suitable for tests: organization `org-test`, UTC days.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            organization_id: OrganizationId::new("org-test"),
            default_branch_id: None,
            utc_offset: Utc.fix(),
            seed_file: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    // Unparseable rates fall back to the default rather than failing startup.
    fn rate(&self, key: &str, default: f32) -> f32 {
        self.optional(key)
            .and_then(|s| s.trim().parse::<f32>().ok())
            .filter(|r| r.is_finite())
            .map_or(default, |r| r.clamp(0.0, 1.0))
    }
}

/// Parse `LD_UTC_OFFSET_MINUTES`; unset means the default offset.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for a non-number or an offset
/// outside UTC-12:00..=UTC+14:00.
pub fn parse_utc_offset(raw: Option<&str>) -> Result<FixedOffset, ConfigError> {
    let invalid =
        |msg: String| ConfigError::InvalidEnvVar("LD_UTC_OFFSET_MINUTES".to_string(), msg);
    let minutes = match raw {
        Some(value) => value.trim().parse::<i32>().map_err(|e| invalid(e.to_string()))?,
        None => DEFAULT_UTC_OFFSET_MINUTES,
    };
    if !(MIN_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&minutes) {
        return Err(invalid(format!(
            "{minutes} is outside {MIN_UTC_OFFSET_MINUTES}..={MAX_UTC_OFFSET_MINUTES}"
        )));
    }
    FixedOffset::east_opt(minutes * 60).ok_or_else(|| invalid(format!("{minutes} minutes")))
}

fn parse_page_size(raw: Option<&str>) -> Result<usize, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("LD_DEFAULT_PAGE_SIZE".to_string(), msg);
    let size = match raw {
        Some(value) => value.trim().parse::<usize>().map_err(|e| invalid(e.to_string()))?,
        None => DEFAULT_PAGE_SIZE,
    };
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(invalid(format!("{size} is outside 1..={MAX_PAGE_SIZE}")));
    }
    Ok(size)
}
