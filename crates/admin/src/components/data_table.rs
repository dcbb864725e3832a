//! Table layouts for the register, catalog and trip screens.
//!
//! The front end renders every list from one of these layouts. A sortable
//! column is declared through its typed sort field, so a header click always
//! sends a `sort` value the list endpoint accepts.

use serde::Serialize;

use lorry_desk_core::sort::{ArticleSortField, BookingSortField, OgplSortField, SortField};
use lorry_desk_core::{BookingStatus, PaymentType};

/// One column of a table layout.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    /// Hidden columns can still be switched on from the column picker.
    pub shown: bool,
}

impl Column {
    /// A column backed by a sort field; the key is the field's query name.
    #[must_use]
    pub fn sorted<F: SortField>(field: F, label: &str) -> Self {
        Self {
            key: field.key().to_owned(),
            label: label.to_owned(),
            sortable: true,
            shown: true,
        }
    }

    /// A display-only column.
    #[must_use]
    pub fn plain(key: &str, label: &str) -> Self {
        Self {
            key: key.to_owned(),
            label: label.to_owned(),
            sortable: false,
            shown: true,
        }
    }

    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.shown = false;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Text,
    Select,
    DateRange,
}

/// A `value`/`label` pair offered by a select filter.
#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_owned(),
            label: label.to_owned(),
        }
    }
}

/// A filter control. `key` is the query parameter it sets.
#[derive(Debug, Clone, Serialize)]
pub struct Filter {
    pub key: String,
    pub label: String,
    pub kind: FilterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub options: Vec<Choice>,
}

impl Filter {
    fn build(key: &str, label: &str, kind: FilterKind) -> Self {
        Self {
            key: key.to_owned(),
            label: label.to_owned(),
            kind,
            placeholder: None,
            options: Vec::new(),
        }
    }

    #[must_use]
    pub fn text(key: &str, label: &str, placeholder: &str) -> Self {
        Self {
            placeholder: Some(placeholder.to_owned()),
            ..Self::build(key, label, FilterKind::Text)
        }
    }

    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<Choice>) -> Self {
        Self {
            options,
            ..Self::build(key, label, FilterKind::Select)
        }
    }

    #[must_use]
    pub fn dates(key: &str, label: &str) -> Self {
        Self::build(key, label, FilterKind::DateRange)
    }
}

/// An action offered for the selected rows.
#[derive(Debug, Clone, Serialize)]
pub struct RowAction {
    pub key: String,
    pub label: String,
    /// Phosphor icon class.
    pub icon: String,
}

impl RowAction {
    fn new(key: &str, label: &str, icon: &str) -> Self {
        Self {
            key: key.to_owned(),
            label: label.to_owned(),
            icon: icon.to_owned(),
        }
    }
}

/// What the list shows when a query matches nothing.
#[derive(Debug, Clone, Serialize)]
pub struct EmptyState {
    pub icon: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Complete layout for one table, as served by `GET /api/tables/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct DataTableConfig {
    pub table_id: String,
    pub columns: Vec<Column>,
    pub filters: Vec<Filter>,
    pub bulk_actions: Vec<RowAction>,
    pub search_placeholder: String,
    pub empty: EmptyState,
    pub has_filters: bool,
    pub has_bulk_actions: bool,
}

impl DataTableConfig {
    fn new(table_id: &str, search_placeholder: &str) -> Self {
        Self {
            table_id: table_id.to_owned(),
            columns: Vec::new(),
            filters: Vec::new(),
            bulk_actions: Vec::new(),
            search_placeholder: search_placeholder.to_owned(),
            empty: EmptyState {
                icon: "ph-list".to_owned(),
                title: "Nothing here yet".to_owned(),
                hint: None,
            },
            has_filters: false,
            has_bulk_actions: false,
        }
    }

    fn columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    fn filter(mut self, filter: Filter) -> Self {
        self.has_filters = true;
        self.filters.push(filter);
        self
    }

    fn action(mut self, action: RowAction) -> Self {
        self.has_bulk_actions = true;
        self.bulk_actions.push(action);
        self
    }

    fn when_empty(mut self, icon: &str, title: &str, hint: Option<&str>) -> Self {
        self.empty = EmptyState {
            icon: icon.to_owned(),
            title: title.to_owned(),
            hint: hint.map(str::to_owned),
        };
        self
    }

    /// Keys of the columns shown before the user touches the picker.
    #[must_use]
    pub fn shown_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.shown)
            .map(|c| c.key.as_str())
            .collect()
    }
}

/// Identifiers accepted by [`table_config`].
pub const TABLE_IDS: [&str; 3] = ["bookings", "articles", "ogpls"];

#[must_use]
pub fn table_config(table_id: &str) -> Option<DataTableConfig> {
    match table_id {
        "bookings" => Some(bookings_table_config()),
        "articles" => Some(articles_table_config()),
        "ogpls" => Some(ogpls_table_config()),
        _ => None,
    }
}

// Keys match the `range` values `DateRangePreset` parses.
fn date_presets() -> Vec<Choice> {
    [
        ("all", "All Time"),
        ("today", "Today"),
        ("yesterday", "Yesterday"),
        ("last_week", "Last 7 Days"),
        ("last_month", "Last Month"),
        ("last_3_months", "Last 3 Months"),
        ("custom", "Custom Range"),
    ]
    .into_iter()
    .map(|(value, label)| Choice::new(value, label))
    .collect()
}

#[must_use]
pub fn bookings_table_config() -> DataTableConfig {
    use BookingSortField as F;

    let statuses = BookingStatus::ALL
        .iter()
        .map(|s| Choice::new(s.as_str(), s.label()))
        .collect();
    let payments = PaymentType::ALL
        .iter()
        .map(|p| Choice::new(p.as_str(), &p.to_string()))
        .collect();

    DataTableConfig::new("bookings", "LR number, party name or mobile")
        .columns([
            Column::sorted(F::LrNumber, "LR No."),
            Column::sorted(F::CreatedAt, "Date"),
            Column::sorted(F::SenderName, "Sender"),
            Column::sorted(F::ReceiverName, "Receiver"),
            Column::sorted(F::FromBranch, "From"),
            Column::sorted(F::ToBranch, "To"),
            Column::plain("article", "Article").hidden(),
            Column::sorted(F::Quantity, "Qty").hidden(),
            Column::sorted(F::TotalAmount, "Amount"),
            Column::sorted(F::PaymentType, "Payment"),
            Column::sorted(F::Status, "Status"),
        ])
        .filter(Filter::select("range", "Date", date_presets()))
        .filter(Filter::dates("custom", "Custom Dates"))
        .filter(Filter::select("status", "Status", statuses))
        .filter(Filter::select("payment_type", "Payment", payments))
        .filter(Filter::text("branch", "Branch", "Branch ID"))
        .action(RowAction::new("load_ogpl", "Load on OGPL", "ph-truck"))
        .action(RowAction::new("export", "Export CSV", "ph-download-simple"))
        .when_empty(
            "ph-package",
            "No bookings found",
            Some("Try a wider date range or clear the filters"),
        )
}

#[must_use]
pub fn articles_table_config() -> DataTableConfig {
    use ArticleSortField as F;

    DataTableConfig::new("articles", "Name, description or HSN code")
        .columns([
            Column::sorted(F::Name, "Article"),
            Column::sorted(F::BaseRate, "Base Rate"),
            Column::sorted(F::HsnCode, "HSN"),
            Column::plain("tax_rate", "Tax %").hidden(),
            Column::plain("unit_of_measure", "Unit"),
            Column::plain("handling", "Handling").hidden(),
            Column::sorted(F::CreatedAt, "Added").hidden(),
        ])
        .filter(Filter::text("branch", "Branch", "Branch ID"))
        .action(RowAction::new("bulk_rate", "Adjust Rates", "ph-percent"))
        .when_empty("ph-cube", "No articles yet", Some("Add one or import a CSV"))
}

#[must_use]
pub fn ogpls_table_config() -> DataTableConfig {
    use OgplSortField as F;

    DataTableConfig::new("ogpls", "OGPL number, vehicle or driver")
        .columns([
            Column::sorted(F::OgplNumber, "OGPL No."),
            Column::sorted(F::Vehicle, "Vehicle"),
            Column::plain("driver", "Driver"),
            Column::plain("route", "Route"),
            Column::sorted(F::TransitDate, "Transit Date"),
            Column::sorted(F::Bookings, "LRs"),
            Column::plain("unloaded", "Unloaded"),
        ])
        .filter(Filter::select("range", "Transit Date", date_presets()))
        .filter(Filter::text("station", "Station", "Branch ID"))
        .filter(Filter::select(
            "unloaded",
            "Unloading",
            vec![Choice::new("false", "Awaiting"), Choice::new("true", "Unloaded")],
        ))
        .when_empty("ph-truck", "No trips found", None)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sortable_keys(config: &DataTableConfig) -> Vec<&str> {
        config
            .columns
            .iter()
            .filter(|c| c.sortable)
            .map(|c| c.key.as_str())
            .collect()
    }

    #[test]
    fn test_every_table_id_resolves() {
        for id in TABLE_IDS {
            assert_eq!(table_config(id).unwrap().table_id, id);
        }
        assert!(table_config("customers").is_none());
    }

    #[test]
    fn test_hidden_columns_start_off() {
        let config = bookings_table_config();
        let shown = config.shown_columns();
        assert!(shown.contains(&"lr_number"));
        assert!(!shown.contains(&"quantity"));
        assert!(!shown.contains(&"article"));
    }

    #[test]
    fn test_sortable_keys_parse_back() {
        for key in sortable_keys(&bookings_table_config()) {
            assert_eq!(key.parse::<BookingSortField>().unwrap().key(), key);
        }
        for key in sortable_keys(&articles_table_config()) {
            assert_eq!(key.parse::<ArticleSortField>().unwrap().key(), key);
        }
        for key in sortable_keys(&ogpls_table_config()) {
            assert_eq!(key.parse::<OgplSortField>().unwrap().key(), key);
        }
    }

    #[test]
    fn test_booking_filters() {
        let config = bookings_table_config();
        let status = config.filters.iter().find(|f| f.key == "status").unwrap();
        assert_eq!(status.options.len(), BookingStatus::ALL.len());
        let payment = config
            .filters
            .iter()
            .find(|f| f.key == "payment_type")
            .unwrap();
        assert_eq!(payment.options.len(), PaymentType::ALL.len());
        assert!(config.has_filters && config.has_bulk_actions);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(articles_table_config()).unwrap();
        assert_eq!(json["table_id"], "articles");
        assert_eq!(json["columns"][1]["key"], "base_rate");
        assert_eq!(json["filters"][0]["kind"], "text");
        assert!(json["empty"].get("hint").is_some());
        assert!(json.get("has_column_picker").is_none());
    }
}
