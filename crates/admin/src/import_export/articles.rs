//! Article catalog CSV.
//!
//! Import requires `name` and `base_rate`; the optional columns are
//! `description`, `hsn_code`, `tax_rate`, `unit_of_measure`,
//! `min_quantity`, `is_fragile`, `requires_special_handling` and `notes`.
//! Header names are matched case-insensitively and unknown columns are
//! ignored, so an export can be edited and imported back.

use std::io;
use std::str::FromStr;

use csv::StringRecord;
use rust_decimal::Decimal;

use lorry_desk_core::BranchId;
use lorry_desk_core::models::{Article, CreateArticleInput};

use super::{ImportError, RowError, parse_flag};

const EXPORT_HEADER: [&str; 13] = [
    "id",
    "name",
    "base_rate",
    "branch_id",
    "description",
    "hsn_code",
    "tax_rate",
    "unit_of_measure",
    "min_quantity",
    "is_fragile",
    "requires_special_handling",
    "notes",
    "created_at",
];

struct Columns {
    name: usize,
    base_rate: usize,
    description: Option<usize>,
    hsn_code: Option<usize>,
    tax_rate: Option<usize>,
    unit_of_measure: Option<usize>,
    min_quantity: Option<usize>,
    is_fragile: Option<usize>,
    requires_special_handling: Option<usize>,
    notes: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, ImportError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        Ok(Self {
            name: find("name").ok_or(ImportError::MissingColumn("name"))?,
            base_rate: find("base_rate").ok_or(ImportError::MissingColumn("base_rate"))?,
            description: find("description"),
            hsn_code: find("hsn_code"),
            tax_rate: find("tax_rate"),
            unit_of_measure: find("unit_of_measure"),
            min_quantity: find("min_quantity"),
            is_fragile: find("is_fragile"),
            requires_special_handling: find("requires_special_handling"),
            notes: find("notes"),
        })
    }
}

/// One row's cells, looked up by column.
struct Row<'a>(&'a StringRecord);

impl Row<'_> {
    fn text(&self, column: Option<usize>) -> Option<String> {
        column
            .and_then(|i| self.0.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }

    fn parse<T: FromStr>(&self, column: Option<usize>, field: &str) -> Result<Option<T>, String> {
        self.text(column)
            .map(|v| {
                v.parse::<T>()
                    .map_err(|_| format!("{field}: `{v}` is not a valid number"))
            })
            .transpose()
    }

    fn flag(&self, column: Option<usize>, field: &str) -> Result<bool, String> {
        self.text(column)
            .map_or(Ok(false), |v| parse_flag(&v).map_err(|e| format!("{field}: {e}")))
    }
}

fn parse_row(
    row: &Row<'_>,
    columns: &Columns,
    branch_id: &BranchId,
) -> Result<CreateArticleInput, String> {
    let base_rate = row
        .parse::<Decimal>(Some(columns.base_rate), "base_rate")?
        .ok_or_else(|| "base_rate: a rate is required".to_owned())?;
    let input = CreateArticleInput {
        name: row.text(Some(columns.name)).unwrap_or_default(),
        description: row.text(columns.description),
        base_rate,
        branch_id: branch_id.clone(),
        hsn_code: row.text(columns.hsn_code),
        tax_rate: row.parse(columns.tax_rate, "tax_rate")?,
        unit_of_measure: row.text(columns.unit_of_measure),
        min_quantity: row.parse(columns.min_quantity, "min_quantity")?,
        is_fragile: row.flag(columns.is_fragile, "is_fragile")?,
        requires_special_handling: row
            .flag(columns.requires_special_handling, "requires_special_handling")?,
        notes: row.text(columns.notes),
    };
    input
        .validate()
        .map_err(|e| format!("{}: {e}", e.field()))?;
    Ok(input)
}

/// Read and validate an article CSV for `branch_id`.
///
/// # Errors
///
/// Returns `ImportError::Rows` listing every bad row, or a structural error
/// if the file is unreadable, lacks a required column, or has no rows.
pub fn parse_articles<R: io::Read>(
    reader: R,
    branch_id: &BranchId,
) -> Result<Vec<CreateArticleInput>, ImportError> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::locate(csv.headers()?)?;

    let mut inputs = Vec::new();
    let mut errors = Vec::new();
    for (index, record) in csv.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(index as u64 + 2, csv::Position::line);
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        match parse_row(&Row(&record), &columns, branch_id) {
            Ok(input) => inputs.push(input),
            Err(message) => errors.push(RowError { line, message }),
        }
    }

    if !errors.is_empty() {
        return Err(ImportError::Rows(errors));
    }
    if inputs.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(inputs)
}

fn opt<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

/// Write the catalog as CSV with a header row.
///
/// # Errors
///
/// Returns `csv::Error` if writing to `out` fails.
pub fn export_articles<W: io::Write>(out: W, articles: &[Article]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(EXPORT_HEADER)?;
    for article in articles {
        writer.write_record([
            article.id.to_string(),
            article.name.clone(),
            article.base_rate.to_string(),
            article.branch_id.to_string(),
            opt(article.description.as_ref()),
            opt(article.hsn_code.as_ref()),
            opt(article.tax_rate.as_ref()),
            opt(article.unit_of_measure.as_ref()),
            opt(article.min_quantity.as_ref()),
            article.is_fragile.to_string(),
            article.requires_special_handling.to_string(),
            opt(article.notes.as_ref()),
            article.created_at.to_rfc3339(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::fixtures;

    fn branch() -> BranchId {
        BranchId::new("br-mum")
    }

    #[test]
    fn test_import_required_and_optional_columns() {
        let csv = "Name,Base_Rate,HSN_Code,is_fragile,min_quantity\n\
                   Cartons,50,4819,no,\n\
                   \"Glass, tempered\",120.5,7007,yes,2\n";
        let inputs = parse_articles(csv.as_bytes(), &branch()).unwrap();

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].name, "Cartons");
        assert_eq!(inputs[0].base_rate, dec!(50));
        assert!(!inputs[0].is_fragile);
        assert_eq!(inputs[1].name, "Glass, tempered");
        assert_eq!(inputs[1].base_rate, dec!(120.5));
        assert!(inputs[1].is_fragile);
        assert_eq!(inputs[1].min_quantity, Some(2));
        assert_eq!(inputs[1].branch_id, branch());
    }

    #[test]
    fn test_import_missing_required_column() {
        let err = parse_articles("name,description\nCartons,boxes\n".as_bytes(), &branch())
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("base_rate")));
    }

    #[test]
    fn test_import_reports_every_bad_row_with_line() {
        let csv = "name,base_rate,tax_rate\n\
                   Cartons,50,12\n\
                   ,40,\n\
                   Drums,abc,\n\
                   Sacks,-5,\n\
                   Bales,30,150\n";
        let err = parse_articles(csv.as_bytes(), &branch()).unwrap_err();

        let ImportError::Rows(rows) = err else {
            panic!("expected row errors");
        };
        let lines: Vec<u64> = rows.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6]);
        assert!(rows[0].message.starts_with("name:"));
        assert!(rows[1].message.starts_with("base_rate:"));
        assert!(rows[2].message.starts_with("base_rate:"));
        assert!(rows[3].message.starts_with("tax_rate:"));
    }

    #[test]
    fn test_import_skips_blank_lines_and_rejects_empty() {
        let err = parse_articles("name,base_rate\n , \n".as_bytes(), &branch()).unwrap_err();
        assert!(matches!(err, ImportError::Empty));
    }

    #[test]
    fn test_export_quotes_and_reimports() {
        let mut article = fixtures::article();
        article.name = "Cartons, \"large\"".to_string();
        article.notes = Some("stack\nupright".to_string());

        let mut out = Vec::new();
        export_articles(&mut out, &[article.clone()]).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.starts_with("id,name,base_rate,branch_id,"));
        assert!(text.contains("\"Cartons, \"\"large\"\"\""));

        let inputs = parse_articles(out.as_slice(), &branch()).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, article.name);
        assert_eq!(inputs[0].notes, article.notes);
        assert_eq!(inputs[0].base_rate, article.base_rate);
        assert_eq!(inputs[0].hsn_code, article.hsn_code);
    }
}
