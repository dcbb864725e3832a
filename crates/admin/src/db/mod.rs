//! Data access for the admin service.
//!
//! The service talks to storage only through [`DataStore`] and
//! [`LrNumberSource`]. [`MemoryStore`] implements both and can be seeded
//! from a JSON or YAML fixture.
//!
//! Every call is scoped to one organization. Branch scoping, where it
//! applies, narrows the result further.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use lorry_desk_core::models::{
    Article, Booking, BookingView, Branch, Customer, CustomerRate, Ogpl, StatusUpdate,
};
use lorry_desk_core::pricing::{RateAdjustment, RatePreview};
use lorry_desk_core::{ArticleId, BookingId, BranchId, OgplId, OrganizationId, QueryContext};

pub use memory::{MemoryStore, SeedData, SeedError};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store could not be reached or refused the call.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate LR number, stale status).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Organization and optional branch a query is limited to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub organization_id: OrganizationId,
    pub branch_id: Option<BranchId>,
}

impl Scope {
    #[must_use]
    pub const fn organization(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            branch_id: None,
        }
    }
}

impl From<&QueryContext> for Scope {
    fn from(ctx: &QueryContext) -> Self {
        Self {
            organization_id: ctx.organization_id.clone(),
            branch_id: ctx.branch_id.clone(),
        }
    }
}

/// Persistence for bookings, catalog, reference data and trips.
#[async_trait]
pub trait DataStore: Send + Sync {
    // -- Bookings -------------------------------------------------------------

    /// Bookings in scope, with joins resolved, oldest first.
    async fn list_bookings(&self, scope: &Scope) -> Result<Vec<BookingView>, RepositoryError>;

    async fn get_booking(
        &self,
        organization_id: &OrganizationId,
        id: &BookingId,
    ) -> Result<BookingView, RepositoryError>;

    /// Insert a booking. Fails with `Conflict` if its LR number is taken.
    async fn create_booking(&self, booking: Booking) -> Result<BookingView, RepositoryError>;

    /// Replace a booking's editable fields. Fails with `Conflict` if the
    /// stored status no longer allows modification.
    async fn update_booking(&self, booking: Booking) -> Result<BookingView, RepositoryError>;

    /// Apply a status change, re-checking the lifecycle against the stored record.
    async fn update_booking_status(
        &self,
        organization_id: &OrganizationId,
        id: &BookingId,
        update: StatusUpdate,
    ) -> Result<BookingView, RepositoryError>;

    async fn lr_number_exists(
        &self,
        organization_id: &OrganizationId,
        lr_number: &str,
    ) -> Result<bool, RepositoryError>;

    // -- Catalog --------------------------------------------------------------

    /// Articles in scope, oldest first.
    async fn list_articles(&self, scope: &Scope) -> Result<Vec<Article>, RepositoryError>;

    async fn get_article(
        &self,
        organization_id: &OrganizationId,
        id: &ArticleId,
    ) -> Result<Article, RepositoryError>;

    async fn create_article(
        &self,
        organization_id: &OrganizationId,
        article: Article,
    ) -> Result<Article, RepositoryError>;

    /// Insert several articles; either all are stored or none are.
    async fn create_articles(
        &self,
        organization_id: &OrganizationId,
        articles: Vec<Article>,
    ) -> Result<usize, RepositoryError>;

    async fn update_article(
        &self,
        organization_id: &OrganizationId,
        article: Article,
    ) -> Result<Article, RepositoryError>;

    /// Apply `adjustment` to the current base rate of each listed article
    /// and return the changes in `ids` order. Either every article is
    /// repriced or none is.
    async fn reprice_articles(
        &self,
        organization_id: &OrganizationId,
        ids: &[ArticleId],
        adjustment: RateAdjustment,
    ) -> Result<Vec<RatePreview>, RepositoryError>;

    async fn get_customer_rates(
        &self,
        organization_id: &OrganizationId,
        article_id: &ArticleId,
    ) -> Result<Vec<CustomerRate>, RepositoryError>;

    // -- Reference data -------------------------------------------------------

    async fn list_branches(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Branch>, RepositoryError>;

    async fn list_customers(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Customer>, RepositoryError>;

    // -- Trips ----------------------------------------------------------------

    /// Trips in scope (either station), oldest first.
    async fn list_ogpls(&self, scope: &Scope) -> Result<Vec<Ogpl>, RepositoryError>;

    async fn get_ogpl(
        &self,
        organization_id: &OrganizationId,
        id: &OgplId,
    ) -> Result<Ogpl, RepositoryError>;

    /// Store a new manifest and move every loaded booking to `in_transit`
    /// in one step. Nothing changes if any booking cannot be dispatched.
    async fn create_ogpl(&self, ogpl: Ogpl) -> Result<Ogpl, RepositoryError>;

    /// Persist an unloaded manifest. Fails with `Conflict` if the stored
    /// manifest was already unloaded.
    async fn record_unloading(&self, ogpl: Ogpl) -> Result<Ogpl, RepositoryError>;
}

/// Issues LR and OGPL numbers.
#[async_trait]
pub trait LrNumberSource: Send + Sync {
    /// Next unused LR number for the organization.
    async fn next_lr_number(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<String, RepositoryError>;

    /// Next unused OGPL number for the organization.
    async fn next_ogpl_number(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<String, RepositoryError>;
}
