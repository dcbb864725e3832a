//! In-memory [`DataStore`] partitioned by organization.
//!
//! Records keep insertion order, so listings come back oldest first. All
//! multi-record writes (trip loading, article import, bulk repricing) run under
//! a single write lock and either fully succeed or leave the store unchanged.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use lorry_desk_core::models::{
    Article, Booking, BookingView, Branch, Customer, CustomerRate, Ogpl, StatusUpdate,
};
use lorry_desk_core::pricing::{RateAdjustment, RatePreview, adjust_rate, compute_total};
use lorry_desk_core::{
    ArticleId, BookingId, BookingStatus, BranchId, CustomerId, OgplId, OrganizationId,
};

use super::{DataStore, LrNumberSource, RepositoryError, Scope};

/// Errors loading a seed fixture.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON seed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML seed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid seed data: {0}")]
    Invalid(String),
}

/// Records for one organization, as loaded from a fixture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedData {
    pub organization_id: OrganizationId,
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub customer_rates: Vec<CustomerRate>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub ogpls: Vec<Ogpl>,
}

impl SeedData {
    /// Read a fixture, choosing the format from the file extension
    /// (`.json`, `.yaml` or `.yml`).
    ///
    /// # Errors
    ///
    /// Returns `SeedError` if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(serde_json::from_str(&raw)?),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Ok(serde_yaml::from_str(&raw)?)
            }
            _ => Err(SeedError::Invalid(format!(
                "unsupported seed file extension: {}",
                path.display()
            ))),
        }
    }

    /// Check cross-record consistency before loading.
    fn check(&self) -> Result<(), SeedError> {
        let org = &self.organization_id;
        let foreign = |kind: &str, id: &str| {
            SeedError::Invalid(format!("{kind} {id} belongs to another organization"))
        };

        if let Some(b) = self.branches.iter().find(|b| &b.organization_id != org) {
            return Err(foreign("branch", b.id.as_str()));
        }
        if let Some(c) = self.customers.iter().find(|c| &c.organization_id != org) {
            return Err(foreign("customer", c.id.as_str()));
        }
        if let Some(b) = self.bookings.iter().find(|b| &b.organization_id != org) {
            return Err(foreign("booking", b.id.as_str()));
        }
        if let Some(o) = self.ogpls.iter().find(|o| &o.organization_id != org) {
            return Err(foreign("ogpl", o.id.as_str()));
        }

        for article in &self.articles {
            article
                .validate()
                .map_err(|e| SeedError::Invalid(format!("article {}: {e}", article.id)))?;
        }

        let mut lr_numbers = HashSet::with_capacity(self.bookings.len());
        for booking in &self.bookings {
            booking
                .validate()
                .map_err(|e| SeedError::Invalid(format!("booking {}: {e}", booking.lr_number)))?;
            let computed = compute_total(&booking.charges());
            if booking.total_amount != computed {
                return Err(SeedError::Invalid(format!(
                    "booking {}: total_amount {} does not match charges ({computed})",
                    booking.lr_number, booking.total_amount
                )));
            }
            if !lr_numbers.insert(booking.lr_number.as_str()) {
                return Err(SeedError::Invalid(format!(
                    "duplicate LR number {}",
                    booking.lr_number
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Default)]
struct OrgData {
    branches: Vec<Branch>,
    customers: Vec<Customer>,
    articles: Vec<Article>,
    customer_rates: Vec<CustomerRate>,
    bookings: Vec<Booking>,
    ogpls: Vec<Ogpl>,
    lr_counter: u64,
    ogpl_counter: u64,
}

impl OrgData {
    fn view(&self, booking: &Booking) -> BookingView {
        let branch = |id: &BranchId| {
            self.branches
                .iter()
                .find(|b| &b.id == id)
                .map(Branch::to_ref)
        };
        let party = |id: &CustomerId| {
            self.customers
                .iter()
                .find(|c| &c.id == id)
                .map(Customer::to_ref)
        };
        BookingView {
            from_branch_details: branch(&booking.from_branch),
            to_branch_details: branch(&booking.to_branch),
            sender: party(&booking.sender_id),
            receiver: party(&booking.receiver_id),
            booking: booking.clone(),
        }
    }

    fn booking_index(&self, id: &BookingId) -> Result<usize, RepositoryError> {
        self.bookings
            .iter()
            .position(|b| &b.id == id)
            .ok_or(RepositoryError::NotFound)
    }

    fn view_at(&self, index: usize) -> Result<BookingView, RepositoryError> {
        self.bookings
            .get(index)
            .map(|b| self.view(b))
            .ok_or(RepositoryError::NotFound)
    }

    fn lr_taken(&self, lr_number: &str) -> bool {
        self.bookings.iter().any(|b| b.lr_number == lr_number)
    }
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    orgs: RwLock<HashMap<OrganizationId, OrgData>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store serving one organization.
    #[must_use]
    pub fn for_organization(organization_id: OrganizationId) -> Self {
        let mut orgs = HashMap::new();
        orgs.insert(organization_id, OrgData::default());
        Self {
            orgs: RwLock::new(orgs),
        }
    }

    /// Build a store holding one organization's fixture.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Invalid` if the fixture is inconsistent.
    pub fn from_seed(seed: SeedData) -> Result<Self, SeedError> {
        seed.check()?;
        let mut orgs = HashMap::new();
        orgs.insert(
            seed.organization_id,
            OrgData {
                branches: seed.branches,
                customers: seed.customers,
                articles: seed.articles,
                customer_rates: seed.customer_rates,
                bookings: seed.bookings,
                ogpls: seed.ogpls,
                lr_counter: 0,
                ogpl_counter: 0,
            },
        );
        Ok(Self {
            orgs: RwLock::new(orgs),
        })
    }

    /// Add reference data for an organization after construction.
    pub async fn insert_branch(&self, branch: Branch) {
        let mut orgs = self.orgs.write().await;
        orgs.entry(branch.organization_id.clone())
            .or_default()
            .branches
            .push(branch);
    }

    pub async fn insert_customer(&self, customer: Customer) {
        let mut orgs = self.orgs.write().await;
        orgs.entry(customer.organization_id.clone())
            .or_default()
            .customers
            .push(customer);
    }

    pub async fn insert_customer_rate(&self, organization_id: &OrganizationId, rate: CustomerRate) {
        let mut orgs = self.orgs.write().await;
        orgs.entry(organization_id.clone())
            .or_default()
            .customer_rates
            .push(rate);
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    // -- Bookings -------------------------------------------------------------

    async fn list_bookings(&self, scope: &Scope) -> Result<Vec<BookingView>, RepositoryError> {
        let orgs = self.orgs.read().await;
        let Some(data) = orgs.get(&scope.organization_id) else {
            return Ok(Vec::new());
        };
        Ok(data
            .bookings
            .iter()
            .filter(|b| {
                scope
                    .branch_id
                    .as_ref()
                    .is_none_or(|br| &b.from_branch == br || &b.to_branch == br)
            })
            .map(|b| data.view(b))
            .collect())
    }

    async fn get_booking(
        &self,
        organization_id: &OrganizationId,
        id: &BookingId,
    ) -> Result<BookingView, RepositoryError> {
        let orgs = self.orgs.read().await;
        let data = orgs.get(organization_id).ok_or(RepositoryError::NotFound)?;
        data.bookings
            .iter()
            .find(|b| &b.id == id)
            .map(|b| data.view(b))
            .ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self, booking), fields(lr_number = %booking.lr_number))]
    async fn create_booking(&self, booking: Booking) -> Result<BookingView, RepositoryError> {
        let mut orgs = self.orgs.write().await;
        let data = orgs.entry(booking.organization_id.clone()).or_default();
        if data.lr_taken(&booking.lr_number) {
            return Err(RepositoryError::Conflict(format!(
                "LR number {} already exists",
                booking.lr_number
            )));
        }
        if data.bookings.iter().any(|b| b.id == booking.id) {
            return Err(RepositoryError::Conflict(format!(
                "booking {} already exists",
                booking.id
            )));
        }
        let view = data.view(&booking);
        data.bookings.push(booking);
        debug!("booking stored");
        Ok(view)
    }

    async fn update_booking(&self, booking: Booking) -> Result<BookingView, RepositoryError> {
        let mut orgs = self.orgs.write().await;
        let data = orgs
            .get_mut(&booking.organization_id)
            .ok_or(RepositoryError::NotFound)?;
        let index = data.booking_index(&booking.id)?;
        let stored = data.bookings.get_mut(index).ok_or(RepositoryError::NotFound)?;
        if !stored.status.is_open() {
            return Err(RepositoryError::Conflict(format!(
                "booking {} is {} and can no longer be modified",
                stored.lr_number, stored.status
            )));
        }
        if stored.lr_number != booking.lr_number {
            return Err(RepositoryError::Conflict(
                "LR number cannot be changed".to_owned(),
            ));
        }
        // The edit was made against a copy read before a status change landed.
        if stored.status != booking.status {
            return Err(RepositoryError::Conflict(format!(
                "booking {} moved to {} while it was being edited",
                stored.lr_number, stored.status
            )));
        }
        *stored = Booking {
            status: stored.status,
            cancellation_reason: stored.cancellation_reason.take(),
            cancelled_at: stored.cancelled_at,
            delivered_at: stored.delivered_at,
            proof_of_delivery: stored.proof_of_delivery.take(),
            created_at: stored.created_at,
            ..booking
        };
        data.view_at(index)
    }

    #[instrument(skip(self, update), fields(status = %update.status))]
    async fn update_booking_status(
        &self,
        organization_id: &OrganizationId,
        id: &BookingId,
        update: StatusUpdate,
    ) -> Result<BookingView, RepositoryError> {
        let mut orgs = self.orgs.write().await;
        let data = orgs.get_mut(organization_id).ok_or(RepositoryError::NotFound)?;
        let index = data.booking_index(id)?;
        data.bookings
            .get_mut(index)
            .ok_or(RepositoryError::NotFound)?
            .apply_status_update(update)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
        data.view_at(index)
    }

    async fn lr_number_exists(
        &self,
        organization_id: &OrganizationId,
        lr_number: &str,
    ) -> Result<bool, RepositoryError> {
        let orgs = self.orgs.read().await;
        Ok(orgs
            .get(organization_id)
            .is_some_and(|data| data.lr_taken(lr_number)))
    }

    // -- Catalog --------------------------------------------------------------

    async fn list_articles(&self, scope: &Scope) -> Result<Vec<Article>, RepositoryError> {
        let orgs = self.orgs.read().await;
        Ok(orgs
            .get(&scope.organization_id)
            .map(|data| {
                data.articles
                    .iter()
                    .filter(|a| scope.branch_id.as_ref().is_none_or(|br| &a.branch_id == br))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_article(
        &self,
        organization_id: &OrganizationId,
        id: &ArticleId,
    ) -> Result<Article, RepositoryError> {
        let orgs = self.orgs.read().await;
        orgs.get(organization_id)
            .and_then(|data| data.articles.iter().find(|a| &a.id == id))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn create_article(
        &self,
        organization_id: &OrganizationId,
        article: Article,
    ) -> Result<Article, RepositoryError> {
        let mut orgs = self.orgs.write().await;
        let data = orgs.entry(organization_id.clone()).or_default();
        if data.articles.iter().any(|a| a.id == article.id) {
            return Err(RepositoryError::Conflict(format!(
                "article {} already exists",
                article.id
            )));
        }
        data.articles.push(article.clone());
        Ok(article)
    }

    async fn create_articles(
        &self,
        organization_id: &OrganizationId,
        articles: Vec<Article>,
    ) -> Result<usize, RepositoryError> {
        let mut orgs = self.orgs.write().await;
        let data = orgs.entry(organization_id.clone()).or_default();

        let mut ids: HashSet<&ArticleId> = data.articles.iter().map(|a| &a.id).collect();
        for article in &articles {
            if !ids.insert(&article.id) {
                return Err(RepositoryError::Conflict(format!(
                    "article {} already exists",
                    article.id
                )));
            }
        }

        let count = articles.len();
        data.articles.extend(articles);
        debug!(count, "articles stored");
        Ok(count)
    }

    async fn update_article(
        &self,
        organization_id: &OrganizationId,
        article: Article,
    ) -> Result<Article, RepositoryError> {
        let mut orgs = self.orgs.write().await;
        let stored = orgs
            .get_mut(organization_id)
            .and_then(|data| data.articles.iter_mut().find(|a| a.id == article.id))
            .ok_or(RepositoryError::NotFound)?;
        *stored = article.clone();
        Ok(article)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn reprice_articles(
        &self,
        organization_id: &OrganizationId,
        ids: &[ArticleId],
        adjustment: RateAdjustment,
    ) -> Result<Vec<RatePreview>, RepositoryError> {
        let mut orgs = self.orgs.write().await;
        let data = orgs.get_mut(organization_id).ok_or(RepositoryError::NotFound)?;

        let mut slots = Vec::with_capacity(ids.len());
        for id in ids {
            let index = data
                .articles
                .iter()
                .position(|a| &a.id == id)
                .ok_or(RepositoryError::NotFound)?;
            slots.push(index);
        }

        let mut changes = Vec::with_capacity(slots.len());
        for index in slots {
            if let Some(article) = data.articles.get_mut(index) {
                let rate = adjust_rate(article.base_rate, adjustment);
                article.base_rate = rate.new_rate;
                changes.push(RatePreview {
                    article_id: article.id.clone(),
                    name: article.name.clone(),
                    branch_id: article.branch_id.clone(),
                    rate,
                });
            }
        }
        debug!(count = changes.len(), "articles repriced");
        Ok(changes)
    }

    async fn get_customer_rates(
        &self,
        organization_id: &OrganizationId,
        article_id: &ArticleId,
    ) -> Result<Vec<CustomerRate>, RepositoryError> {
        let orgs = self.orgs.read().await;
        Ok(orgs
            .get(organization_id)
            .map(|data| {
                data.customer_rates
                    .iter()
                    .filter(|r| &r.article_id == article_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    // -- Reference data -------------------------------------------------------

    async fn list_branches(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Branch>, RepositoryError> {
        let orgs = self.orgs.read().await;
        Ok(orgs
            .get(organization_id)
            .map(|data| data.branches.clone())
            .unwrap_or_default())
    }

    async fn list_customers(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let orgs = self.orgs.read().await;
        Ok(orgs
            .get(organization_id)
            .map(|data| data.customers.clone())
            .unwrap_or_default())
    }

    // -- Trips ----------------------------------------------------------------

    async fn list_ogpls(&self, scope: &Scope) -> Result<Vec<Ogpl>, RepositoryError> {
        let orgs = self.orgs.read().await;
        Ok(orgs
            .get(&scope.organization_id)
            .map(|data| {
                data.ogpls
                    .iter()
                    .filter(|o| {
                        scope
                            .branch_id
                            .as_ref()
                            .is_none_or(|br| &o.from_station == br || &o.to_station == br)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_ogpl(
        &self,
        organization_id: &OrganizationId,
        id: &OgplId,
    ) -> Result<Ogpl, RepositoryError> {
        let orgs = self.orgs.read().await;
        orgs.get(organization_id)
            .and_then(|data| data.ogpls.iter().find(|o| &o.id == id))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self, ogpl), fields(ogpl_number = %ogpl.ogpl_number))]
    async fn create_ogpl(&self, ogpl: Ogpl) -> Result<Ogpl, RepositoryError> {
        let mut orgs = self.orgs.write().await;
        let data = orgs.get_mut(&ogpl.organization_id).ok_or(RepositoryError::NotFound)?;
        if data.ogpls.iter().any(|o| o.ogpl_number == ogpl.ogpl_number) {
            return Err(RepositoryError::Conflict(format!(
                "OGPL number {} already exists",
                ogpl.ogpl_number
            )));
        }

        // Dispatch copies first so a failure leaves every booking untouched.
        let mut dispatched = Vec::with_capacity(ogpl.loading_records.len());
        for record in &ogpl.loading_records {
            let (index, booking) = data
                .bookings
                .iter()
                .enumerate()
                .find(|(_, b)| b.id == record.booking_id)
                .ok_or(RepositoryError::NotFound)?;
            if booking.status != BookingStatus::Booked {
                return Err(RepositoryError::Conflict(format!(
                    "booking {} is {} and cannot be loaded",
                    booking.lr_number, booking.status
                )));
            }
            let mut next = booking.clone();
            next.apply_status_update(StatusUpdate {
                status: BookingStatus::InTransit,
                at: ogpl.created_at,
                cancellation_reason: None,
                proof_of_delivery: None,
            })
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
            dispatched.push((index, next));
        }

        for (index, booking) in dispatched {
            if let Some(slot) = data.bookings.get_mut(index) {
                *slot = booking;
            }
        }
        data.ogpls.push(ogpl.clone());
        debug!(bookings = ogpl.loading_records.len(), "ogpl stored");
        Ok(ogpl)
    }

    async fn record_unloading(&self, ogpl: Ogpl) -> Result<Ogpl, RepositoryError> {
        let mut orgs = self.orgs.write().await;
        let stored = orgs
            .get_mut(&ogpl.organization_id)
            .and_then(|data| data.ogpls.iter_mut().find(|o| o.id == ogpl.id))
            .ok_or(RepositoryError::NotFound)?;
        if stored.is_unloaded() {
            return Err(RepositoryError::Conflict(format!(
                "OGPL {} has already been unloaded",
                stored.ogpl_number
            )));
        }
        *stored = ogpl.clone();
        Ok(ogpl)
    }
}

#[async_trait]
impl LrNumberSource for MemoryStore {
    async fn next_lr_number(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<String, RepositoryError> {
        let mut orgs = self.orgs.write().await;
        let data = orgs.entry(organization_id.clone()).or_default();
        loop {
            data.lr_counter += 1;
            let candidate = format!("LR{:06}", data.lr_counter);
            if !data.lr_taken(&candidate) {
                return Ok(candidate);
            }
        }
    }

    async fn next_ogpl_number(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<String, RepositoryError> {
        let mut orgs = self.orgs.write().await;
        let data = orgs.entry(organization_id.clone()).or_default();
        loop {
            data.ogpl_counter += 1;
            let candidate = format!("OGPL{:06}", data.ogpl_counter);
            if !data.ogpls.iter().any(|o| o.ogpl_number == candidate) {
                return Ok(candidate);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use rust_decimal::Decimal;

    use super::*;
    use crate::fixtures;
    use lorry_desk_core::models::{CreateOgplInput, ProofOfDelivery};

    fn store() -> MemoryStore {
        MemoryStore::from_seed(fixtures::seed()).unwrap()
    }

    fn org() -> OrganizationId {
        fixtures::org()
    }

    async fn stored_booking(store: &MemoryStore, id: &str, lr: &str) -> Booking {
        let booking = fixtures::booking(id, lr);
        store.create_booking(booking.clone()).await.unwrap();
        booking
    }

    fn trip(bookings: &[Booking], number: &str) -> Ogpl {
        CreateOgplInput {
            ogpl_number: None,
            vehicle: "MH12AB1234".to_owned(),
            from_station: BranchId::new("br-mum"),
            to_station: BranchId::new("br-pun"),
            primary_driver_name: "Suresh".to_owned(),
            primary_driver_mobile: "9822012345".to_owned(),
            transit_date: fixtures::at().date_naive(),
            departure_time: None,
            arrival_time: None,
            booking_ids: bookings.iter().map(|b| b.id.clone()).collect(),
        }
        .into_ogpl(
            OgplId::new(format!("ogpl-{number}")),
            org(),
            number.to_owned(),
            bookings,
            fixtures::at(),
        )
    }

    #[tokio::test]
    async fn test_create_resolves_view() {
        let store = store();
        let booking = fixtures::booking("bk-1", "LR000001");
        let view = store.create_booking(booking).await.unwrap();

        assert_eq!(view.sender_name(), Some("Ravi Traders"));
        assert_eq!(view.receiver_name(), Some("Pune Mart"));
        assert_eq!(view.from_branch_name(), Some("Mumbai"));
        assert_eq!(view.to_branch_name(), Some("Pune"));
    }

    #[tokio::test]
    async fn test_duplicate_lr_number_conflicts() {
        let store = store();
        stored_booking(&store, "bk-1", "LR000001").await;

        let err = store
            .create_booking(fixtures::booking("bk-2", "LR000001"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(store.lr_number_exists(&org(), "LR000001").await.unwrap());
    }

    #[tokio::test]
    async fn test_generated_lr_numbers_skip_taken() {
        let store = store();
        stored_booking(&store, "bk-1", "LR000001").await;

        assert_eq!(store.next_lr_number(&org()).await.unwrap(), "LR000002");
        assert_eq!(store.next_lr_number(&org()).await.unwrap(), "LR000003");
        assert_eq!(store.next_ogpl_number(&org()).await.unwrap(), "OGPL000001");
    }

    #[tokio::test]
    async fn test_organizations_are_isolated() {
        let store = store();
        stored_booking(&store, "bk-1", "LR000001").await;

        let other = OrganizationId::new("org-other");
        assert!(store.list_bookings(&Scope::organization(other.clone())).await.unwrap().is_empty());
        assert!(matches!(
            store.get_booking(&other, &BookingId::new("bk-1")).await,
            Err(RepositoryError::NotFound)
        ));
        assert_eq!(store.next_lr_number(&other).await.unwrap(), "LR000001");
    }

    #[tokio::test]
    async fn test_branch_scope_matches_either_end() {
        let store = store();
        stored_booking(&store, "bk-1", "LR000001").await;

        let pune = Scope {
            organization_id: org(),
            branch_id: Some(BranchId::new("br-pun")),
        };
        let delhi = Scope {
            organization_id: org(),
            branch_id: Some(BranchId::new("br-del")),
        };
        assert_eq!(store.list_bookings(&pune).await.unwrap().len(), 1);
        assert!(store.list_bookings(&delhi).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_update_rechecks_lifecycle() {
        let store = store();
        let booking = stored_booking(&store, "bk-1", "LR000001").await;
        let proof = ProofOfDelivery {
            receiver_name: "Anil".to_owned(),
            receiver_phone: "9876543210".to_owned(),
            delivered_at: fixtures::at(),
            signature: "sig".to_owned(),
            photo: None,
        };
        let deliver = StatusUpdate {
            status: BookingStatus::Delivered,
            at: fixtures::at(),
            cancellation_reason: None,
            proof_of_delivery: Some(proof),
        };

        let err = store
            .update_booking_status(&org(), &booking.id, deliver)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        let view = store.get_booking(&org(), &booking.id).await.unwrap();
        assert_eq!(view.booking.status, BookingStatus::Booked);
    }

    #[tokio::test]
    async fn test_update_rejects_closed_booking() {
        let store = store();
        let mut booking = stored_booking(&store, "bk-1", "LR000001").await;
        let update = booking.cancel("customer request", fixtures::at()).unwrap();
        store
            .update_booking_status(&org(), &booking.id, update)
            .await
            .unwrap();

        booking.remarks = Some("late edit".to_owned());
        let err = store.update_booking(booking).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_stale_edit_cannot_undo_dispatch() {
        let store = store();
        let booking = stored_booking(&store, "bk-1", "LR000001").await;
        let mut stale = store.get_booking(&org(), &booking.id).await.unwrap().booking;

        let mut dispatched = booking.clone();
        let update = dispatched.dispatch(fixtures::at()).unwrap();
        store
            .update_booking_status(&org(), &booking.id, update)
            .await
            .unwrap();

        stale.remarks = Some("edited before dispatch was seen".to_owned());
        let err = store.update_booking(stale).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let view = store.get_booking(&org(), &booking.id).await.unwrap();
        assert_eq!(view.booking.status, BookingStatus::InTransit);
        assert!(view.booking.remarks.is_none());

        // The booking is not free for a second trip either.
        let err = store
            .create_ogpl(trip(&[view.booking.clone()], "OGPL000009"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_edit_keeps_lifecycle_fields() {
        let store = store();
        let booking = stored_booking(&store, "bk-1", "LR000001").await;
        let mut edited = booking.clone();
        edited.remarks = Some("handle with care".to_owned());
        edited.created_at = fixtures::at() + Duration::days(3);
        edited.cancellation_reason = Some("forged".to_owned());

        let view = store.update_booking(edited).await.unwrap();
        assert_eq!(view.booking.remarks.as_deref(), Some("handle with care"));
        assert_eq!(view.booking.created_at, booking.created_at);
        assert!(view.booking.cancellation_reason.is_none());
        assert_eq!(view.booking.status, BookingStatus::Booked);
    }

    #[tokio::test]
    async fn test_create_ogpl_dispatches_all_bookings() {
        let store = store();
        let a = stored_booking(&store, "bk-1", "LR000001").await;
        let b = stored_booking(&store, "bk-2", "LR000002").await;

        store.create_ogpl(trip(&[a.clone(), b], "OGPL000001")).await.unwrap();

        for view in store.list_bookings(&Scope::organization(org())).await.unwrap() {
            assert_eq!(view.booking.status, BookingStatus::InTransit);
        }
        assert_eq!(store.list_ogpls(&Scope::organization(org())).await.unwrap().len(), 1);
        assert!(store.create_ogpl(trip(&[a], "OGPL000002")).await.is_err());
    }

    #[tokio::test]
    async fn test_create_ogpl_is_all_or_nothing() {
        let store = store();
        let a = stored_booking(&store, "bk-1", "LR000001").await;
        let mut b = stored_booking(&store, "bk-2", "LR000002").await;
        let update = b.cancel("damaged at pickup", fixtures::at()).unwrap();
        store.update_booking_status(&org(), &b.id, update).await.unwrap();

        let err = store.create_ogpl(trip(&[a.clone(), b], "OGPL000001")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let view = store.get_booking(&org(), &a.id).await.unwrap();
        assert_eq!(view.booking.status, BookingStatus::Booked);
        assert!(store.list_ogpls(&Scope::organization(org())).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unloading_is_recorded_once() {
        let store = store();
        let a = stored_booking(&store, "bk-1", "LR000001").await;
        let mut ogpl = store.create_ogpl(trip(&[a], "OGPL000001")).await.unwrap();

        ogpl.unloaded_at = Some(fixtures::at() + Duration::hours(5));
        store.record_unloading(ogpl.clone()).await.unwrap();
        let err = store.record_unloading(ogpl).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_articles_all_or_nothing() {
        let store = store();
        let existing = fixtures::article();
        let fresh = Article {
            id: ArticleId::new("art-new"),
            ..existing.clone()
        };

        let err = store
            .create_articles(&org(), vec![fresh.clone(), existing])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.list_articles(&Scope::organization(org())).await.unwrap().len(), 1);

        assert_eq!(store.create_articles(&org(), vec![fresh]).await.unwrap(), 1);
        assert_eq!(store.list_articles(&Scope::organization(org())).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reprice_is_all_or_nothing() {
        let store = store();
        let known = fixtures::article();
        let ids = [known.id.clone(), ArticleId::new("art-missing")];

        let err = store
            .reprice_articles(&org(), &ids, RateAdjustment::fixed(Decimal::TEN))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        let stored = store.get_article(&org(), &known.id).await.unwrap();
        assert_eq!(stored.base_rate, known.base_rate);
    }

    #[tokio::test]
    async fn test_reprice_starts_from_current_rate() {
        let store = store();
        let mut article = fixtures::article();
        let ids = [article.id.clone()];

        // A rate edited after the caller listed the catalog.
        article.base_rate = Decimal::ONE_HUNDRED;
        store.update_article(&org(), article.clone()).await.unwrap();

        let ten = RateAdjustment::fixed(Decimal::TEN);
        let changes = store.reprice_articles(&org(), &ids, ten).await.unwrap();
        assert_eq!(changes.first().unwrap().rate.old_rate, Decimal::ONE_HUNDRED);

        // Two adjustments in a row both land.
        store.reprice_articles(&org(), &ids, ten).await.unwrap();
        let stored = store.get_article(&org(), &article.id).await.unwrap();
        assert_eq!(stored.base_rate, Decimal::from(120));
    }

    #[tokio::test]
    async fn test_customer_rates_by_article() {
        let store = store();
        let rates = store
            .get_customer_rates(&org(), &ArticleId::new("art-cartons"))
            .await
            .unwrap();
        assert_eq!(rates.len(), 1);
        assert!(store
            .get_customer_rates(&org(), &ArticleId::new("art-none"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_empty_organization_lists_nothing() {
        let store = MemoryStore::for_organization(org());
        assert!(store.list_branches(&org()).await.unwrap().is_empty());
        assert!(store.list_bookings(&Scope::organization(org())).await.unwrap().is_empty());
    }

    #[test]
    fn test_seed_rejects_foreign_records() {
        let mut seed = fixtures::seed();
        seed.branches.first_mut().unwrap().organization_id = OrganizationId::new("org-other");
        assert!(matches!(MemoryStore::from_seed(seed), Err(SeedError::Invalid(_))));
    }

    #[test]
    fn test_seed_rejects_total_that_contradicts_charges() {
        let mut seed = fixtures::seed();
        let mut booking = fixtures::booking("bk-1", "LR000001");
        booking.total_amount = Decimal::from(999_999);
        seed.bookings.push(booking.clone());
        let err = MemoryStore::from_seed(seed.clone()).unwrap_err();
        assert!(err.to_string().contains("total_amount"), "{err}");

        booking.total_amount = compute_total(&booking.charges());
        *seed.bookings.last_mut().unwrap() = booking;
        assert!(MemoryStore::from_seed(seed).is_ok());
    }

    #[test]
    fn test_seed_parses_yaml() {
        let yaml = r"
organization_id: org-1
branches:
  - id: br-mum
    organization_id: org-1
    name: Mumbai
    is_head_office: true
";
        let seed: SeedData = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(seed.branches.len(), 1);
        assert!(seed.bookings.is_empty());
        assert!(MemoryStore::from_seed(seed).is_ok());
    }
}
