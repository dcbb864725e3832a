//! Reusable UI component configuration.

pub mod data_table;

pub use data_table::{DataTableConfig, TABLE_IDS, table_config};
