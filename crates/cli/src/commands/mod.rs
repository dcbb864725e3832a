//! Subcommand implementations.
//!
//! Commands that work on stored records read a seed fixture (JSON or YAML)
//! into a [`MemoryStore`] and run the same services the dashboard API uses.
//! Output goes to a caller-supplied writer so each command can be tested
//! against a buffer.

pub mod export;
pub mod import;
pub mod quote;
pub mod report;
pub mod reprice;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use lorry_desk_admin::config::{ConfigError, parse_utc_offset};
use lorry_desk_admin::db::{DataStore, MemoryStore, SeedData, SeedError};
use lorry_desk_admin::error::AppError;
use lorry_desk_admin::import_export::ImportError;
use lorry_desk_admin::services::{
    AnalyticsService, ArticleService, BookingService, LogMessenger, TracingNotifier,
};
use lorry_desk_core::QueryContext;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

/// A fixture loaded into memory, with the context commands query it under.
pub struct Dataset {
    pub store: Arc<MemoryStore>,
    pub ctx: QueryContext,
}

impl Dataset {
    /// Load a seed file. Calendar days follow `LD_UTC_OFFSET_MINUTES`.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if the file is unreadable or inconsistent, or the
    /// offset variable is invalid.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let seed = SeedData::from_path(path)?;
        info!(
            path = %path.display(),
            organization_id = %seed.organization_id,
            bookings = seed.bookings.len(),
            articles = seed.articles.len(),
            "Loaded seed file"
        );
        let offset = parse_utc_offset(std::env::var("LD_UTC_OFFSET_MINUTES").ok().as_deref())?;
        let ctx =
            QueryContext::new(seed.organization_id.clone(), Utc::now()).with_utc_offset(offset);
        Ok(Self {
            store: Arc::new(MemoryStore::from_seed(seed)?),
            ctx,
        })
    }

    fn data_store(&self) -> Arc<dyn DataStore> {
        self.store.clone()
    }

    pub(crate) fn analytics(&self) -> AnalyticsService {
        AnalyticsService::new(self.data_store())
    }

    pub(crate) fn articles(&self) -> ArticleService {
        ArticleService::new(self.data_store(), Arc::new(TracingNotifier))
    }

    pub(crate) fn bookings(&self) -> BookingService {
        BookingService::new(
            self.data_store(),
            self.store.clone(),
            Arc::new(LogMessenger),
            Arc::new(TracingNotifier),
        )
    }
}
