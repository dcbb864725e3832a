//! Trip manifests (OGPLs): loading bookings onto a vehicle and recording
//! what arrived.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use lorry_desk_core::filter::{OgplFilter, filter_ogpls};
use lorry_desk_core::models::{Booking, CreateOgplInput, Ogpl, UnloadingEntry};
use lorry_desk_core::sort::{OgplSortField, SortState, sort_records};
use lorry_desk_core::{BookingStatus, OgplId, QueryContext};

use super::messaging::Messenger;
use super::notify::Notifier;
use crate::db::{DataStore, LrNumberSource, RepositoryError, Scope};
use crate::error::AppError;

/// OGPL operations for one organization.
pub struct OgplService {
    store: Arc<dyn DataStore>,
    numbers: Arc<dyn LrNumberSource>,
    messenger: Arc<dyn Messenger>,
    notifier: Arc<dyn Notifier>,
}

impl OgplService {
    #[must_use]
    pub fn new(
        store: Arc<dyn DataStore>,
        numbers: Arc<dyn LrNumberSource>,
        messenger: Arc<dyn Messenger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            numbers,
            messenger,
            notifier,
        }
    }

    /// # Errors
    ///
    /// Returns error if the store rejects the read.
    pub async fn list(
        &self,
        ctx: &QueryContext,
        filter: &OgplFilter,
        sort: SortState<OgplSortField>,
    ) -> Result<Vec<Ogpl>, AppError> {
        let ogpls = self.store.list_ogpls(&Scope::from(ctx)).await?;
        Ok(sort_records(&filter_ogpls(&ogpls, filter, ctx), sort))
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown ID.
    pub async fn get(&self, ctx: &QueryContext, id: &OgplId) -> Result<Ogpl, AppError> {
        self.store
            .get_ogpl(&ctx.organization_id, id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AppError::NotFound(format!("OGPL {id}")),
                other => other.into(),
            })
    }

    /// Load bookings onto a new trip and move them to `in_transit`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for invalid input,
    /// `AppError::NotFound` for an unknown booking and
    /// `AppError::PreconditionFailed` if any booking is not `booked`.
    /// Nothing is created on error.
    #[instrument(
        skip(self, ctx, input),
        fields(vehicle = %input.vehicle, bookings = input.booking_ids.len())
    )]
    pub async fn create(
        &self,
        ctx: &QueryContext,
        input: CreateOgplInput,
    ) -> Result<Ogpl, AppError> {
        input.validate()?;

        let mut bookings: Vec<Booking> = Vec::with_capacity(input.booking_ids.len());
        for id in &input.booking_ids {
            let booking = self
                .store
                .get_booking(&ctx.organization_id, id)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound => AppError::NotFound(format!("booking {id}")),
                    other => other.into(),
                })?
                .booking;
            if booking.status != BookingStatus::Booked {
                return Err(AppError::PreconditionFailed(format!(
                    "LR {} is {} and cannot be loaded",
                    booking.lr_number,
                    booking.status.label()
                )));
            }
            bookings.push(booking);
        }

        let ogpl_number = match input.ogpl_number.as_deref().map(str::trim) {
            Some(manual) if !manual.is_empty() => manual.to_owned(),
            _ => self.numbers.next_ogpl_number(&ctx.organization_id).await?,
        };
        let ogpl = input.into_ogpl(
            OgplId::new(Uuid::new_v4().to_string()),
            ctx.organization_id.clone(),
            ogpl_number,
            &bookings,
            ctx.now,
        );

        let ogpl = match self.store.create_ogpl(ogpl).await {
            Ok(ogpl) => ogpl,
            Err(e) => {
                self.notifier.error("Loading failed", &e.to_string());
                return Err(e.into());
            }
        };
        info!(ogpl_number = %ogpl.ogpl_number, "OGPL created");
        self.notifier.success(
            "Loading recorded",
            &format!(
                "{} booking(s) loaded on OGPL {}",
                ogpl.loading_records.len(),
                ogpl.ogpl_number
            ),
        );

        for id in ogpl.booking_ids() {
            let sent = match self.store.get_booking(&ctx.organization_id, id).await {
                Ok(view) => self.messenger.send_status_update_sms(&view).await,
                Err(e) => {
                    warn!(error = %e, booking_id = %id, "Loaded booking not readable");
                    continue;
                }
            };
            if let Err(e) = sent {
                warn!(error = %e, booking_id = %id, "Status SMS not sent");
            }
        }
        Ok(ogpl)
    }

    /// Record the condition of every booking on arrival.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PreconditionFailed` if the trip was already
    /// unloaded and `AppError::Validation` for missing, duplicate or unknown
    /// entries.
    #[instrument(skip(self, ctx, id, entries), fields(ogpl_id = %id, entries = entries.len()))]
    pub async fn unload(
        &self,
        ctx: &QueryContext,
        id: &OgplId,
        entries: Vec<UnloadingEntry>,
    ) -> Result<Ogpl, AppError> {
        let mut ogpl = self.get(ctx, id).await?;
        if let Err(e) = ogpl.unload(entries, ctx.now) {
            self.notifier.error("Unloading failed", &e.to_string());
            return Err(e.into());
        }
        let ogpl = self.store.record_unloading(ogpl).await?;

        let flagged = ogpl
            .unloading_records
            .iter()
            .filter(|r| r.condition.requires_remarks())
            .count();
        info!(ogpl_number = %ogpl.ogpl_number, flagged, "OGPL unloaded");
        self.notifier.success(
            "Unloading recorded",
            &format!("OGPL {} unloaded, {flagged} item(s) flagged", ogpl.ogpl_number),
        );
        Ok(ogpl)
    }
}
