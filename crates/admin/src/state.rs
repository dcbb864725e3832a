//! Application state shared across handlers.

use std::sync::Arc;

use chrono::Utc;

use lorry_desk_core::{BranchId, QueryContext};

use crate::config::AdminConfig;
use crate::db::{DataStore, LrNumberSource, MemoryStore};
use crate::services::{
    AnalyticsService, ArticleService, BookingService, LogMessenger, Messenger, Notifier,
    OgplService, TracingNotifier,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: Arc<dyn DataStore>,
    numbers: Arc<dyn LrNumberSource>,
    messenger: Arc<dyn Messenger>,
    notifier: Arc<dyn Notifier>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: AdminConfig,
        store: Arc<dyn DataStore>,
        numbers: Arc<dyn LrNumberSource>,
        messenger: Arc<dyn Messenger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                numbers,
                messenger,
                notifier,
            }),
        }
    }

    /// State backed by one memory store, logging SMS and notices.
    #[must_use]
    pub fn with_memory_store(config: AdminConfig, store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self::new(
            config,
            store.clone(),
            store,
            Arc::new(LogMessenger),
            Arc::new(TracingNotifier),
        )
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.inner.store
    }

    /// Context for a request made now, acting from `branch` or the
    /// configured default branch.
    #[must_use]
    pub fn query_context(&self, branch: Option<BranchId>) -> QueryContext {
        let config = &self.inner.config;
        QueryContext::new(config.organization_id.clone(), Utc::now())
            .with_utc_offset(config.utc_offset)
            .with_branch(branch.or_else(|| config.default_branch_id.clone()))
    }

    // =========================================================================
    // Services
    // =========================================================================

    #[must_use]
    pub fn bookings(&self) -> BookingService {
        BookingService::new(
            self.inner.store.clone(),
            self.inner.numbers.clone(),
            self.inner.messenger.clone(),
            self.inner.notifier.clone(),
        )
    }

    #[must_use]
    pub fn articles(&self) -> ArticleService {
        ArticleService::new(self.inner.store.clone(), self.inner.notifier.clone())
    }

    #[must_use]
    pub fn ogpls(&self) -> OgplService {
        OgplService::new(
            self.inner.store.clone(),
            self.inner.numbers.clone(),
            self.inner.messenger.clone(),
            self.inner.notifier.clone(),
        )
    }

    #[must_use]
    pub fn analytics(&self) -> AnalyticsService {
        AnalyticsService::new(self.inner.store.clone())
    }
}
