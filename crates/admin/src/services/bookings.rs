//! Booking lifecycle: creation, edits and status transitions.
//!
//! Every operation validates against the core rules before calling the
//! store. The store re-checks status transitions under its write lock, so
//! two concurrent requests cannot both move the same booking, and an edit
//! made against a copy whose status has since changed is rejected.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use lorry_desk_core::filter::{BookingFilter, filter_bookings};
use lorry_desk_core::models::{
    Booking, BookingError, BookingView, CreateBookingInput, ProofOfDelivery, StatusUpdate,
    UpdateBookingInput,
};
use lorry_desk_core::sort::{BookingSortField, Page, SortState, paginate, sort_records};
use lorry_desk_core::{BookingId, QueryContext};

use super::messaging::Messenger;
use super::notify::Notifier;
use crate::db::{DataStore, LrNumberSource, RepositoryError, Scope};
use crate::error::AppError;

/// Booking operations for one organization.
pub struct BookingService {
    store: Arc<dyn DataStore>,
    numbers: Arc<dyn LrNumberSource>,
    messenger: Arc<dyn Messenger>,
    notifier: Arc<dyn Notifier>,
}

impl BookingService {
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

    /// Filtered and sorted bookings, unpaginated.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the read.
    pub async fn filtered(
        &self,
        ctx: &QueryContext,
        filter: &BookingFilter,
        sort: SortState<BookingSortField>,
    ) -> Result<Vec<BookingView>, AppError> {
        let records = self.store.list_bookings(&Scope::from(ctx)).await?;
        let matching = filter_bookings(&records, filter, ctx);
        Ok(sort_records(&matching, sort))
    }

    /// One page of the booking register.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the read.
    #[instrument(skip(self, ctx, filter))]
    pub async fn list(
        &self,
        ctx: &QueryContext,
        filter: &BookingFilter,
        sort: SortState<BookingSortField>,
        page: usize,
        per_page: usize,
    ) -> Result<Page<BookingView>, AppError> {
        let sorted = self.filtered(ctx, filter, sort).await?;
        Ok(paginate(&sorted, page, per_page))
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown ID.
    pub async fn get(&self, ctx: &QueryContext, id: &BookingId) -> Result<BookingView, AppError> {
        self.store
            .get_booking(&ctx.organization_id, id)
            .await
            .map_err(|e| not_found(e, id))
    }

    /// Create a booking with a generated or manual LR number.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for invalid input, an unknown branch or
    /// customer, or a manual LR number already in use.
    #[instrument(skip(self, ctx, input), fields(org = %ctx.organization_id))]
    pub async fn create(
        &self,
        ctx: &QueryContext,
        mut input: CreateBookingInput,
    ) -> Result<BookingView, AppError> {
        input.validate()?;
        self.check_references(ctx, &input).await?;

        if let (None, Some(article_id)) = (&input.article_name, &input.article_id) {
            let article = self
                .store
                .get_article(&ctx.organization_id, article_id)
                .await
                .map_err(|_| AppError::validation("article_id", "unknown article"))?;
            input.article_name = Some(article.name);
        }

        let lr_number = match input.manual_lr_number() {
            Some(manual) => {
                let manual = manual.to_owned();
                if self
                    .store
                    .lr_number_exists(&ctx.organization_id, &manual)
                    .await?
                {
                    return Err(AppError::validation(
                        "lr_number",
                        format!("LR number {manual} is already in use"),
                    ));
                }
                manual
            }
            None => self.numbers.next_lr_number(&ctx.organization_id).await?,
        };

        let booking = input.into_booking(
            BookingId::new(Uuid::new_v4().to_string()),
            ctx.organization_id.clone(),
            lr_number,
            ctx.now,
        );
        let view = self.store.create_booking(booking).await?;
        info!(
            lr_number = %view.booking.lr_number,
            total = %view.booking.total_amount,
            "Booking created"
        );

        self.notifier.success(
            "Booking created",
            &format!("LR {} has been booked", view.booking.lr_number),
        );
        if let Err(e) = self.messenger.send_booking_sms(&view).await {
            warn!(error = %e, lr_number = %view.booking.lr_number, "Booking SMS not sent");
        }
        Ok(view)
    }

    /// Edit an open booking and recompute its total.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PreconditionFailed` for delivered or cancelled
    /// bookings and `AppError::Validation` for invalid edits.
    #[instrument(skip(self, ctx, id, input), fields(booking_id = %id))]
    pub async fn modify(
        &self,
        ctx: &QueryContext,
        id: &BookingId,
        input: UpdateBookingInput,
    ) -> Result<BookingView, AppError> {
        let mut booking = self.get(ctx, id).await?.booking;
        booking.apply_modification(input, ctx.now)?;
        let view = self.store.update_booking(booking).await?;
        self.notifier.success(
            "Booking updated",
            &format!("LR {} has been updated", view.booking.lr_number),
        );
        Ok(view)
    }

    /// # Errors
    ///
    /// Returns `AppError::PreconditionFailed` unless the booking is `booked`.
    #[instrument(skip(self, ctx, id), fields(booking_id = %id))]
    pub async fn dispatch(
        &self,
        ctx: &QueryContext,
        id: &BookingId,
    ) -> Result<BookingView, AppError> {
        let at = ctx.now;
        self.transition(ctx, id, "Dispatch", |b| b.dispatch(at)).await
    }

    /// # Errors
    ///
    /// Returns `AppError::Validation` for an incomplete proof of delivery and
    /// `AppError::PreconditionFailed` unless the booking is `in_transit`.
    #[instrument(skip(self, ctx, id, proof), fields(booking_id = %id))]
    pub async fn deliver(
        &self,
        ctx: &QueryContext,
        id: &BookingId,
        proof: ProofOfDelivery,
    ) -> Result<BookingView, AppError> {
        let at = ctx.now;
        self.transition(ctx, id, "Delivery", |b| b.deliver(proof, at)).await
    }

    /// # Errors
    ///
    /// Returns `AppError::Validation` for a blank reason and
    /// `AppError::PreconditionFailed` for delivered or cancelled bookings.
    #[instrument(skip(self, ctx, id, reason), fields(booking_id = %id))]
    pub async fn cancel(
        &self,
        ctx: &QueryContext,
        id: &BookingId,
        reason: &str,
    ) -> Result<BookingView, AppError> {
        let at = ctx.now;
        self.transition(ctx, id, "Cancellation", |b| b.cancel(reason, at)).await
    }

    /// Check the change locally, persist it, then notify. Messaging
    /// failures are logged and never undo the change.
    async fn transition<F>(
        &self,
        ctx: &QueryContext,
        id: &BookingId,
        label: &str,
        change: F,
    ) -> Result<BookingView, AppError>
    where
        F: FnOnce(&mut Booking) -> Result<StatusUpdate, BookingError> + Send,
    {
        let result = self.apply_transition(ctx, id, change).await;
        match &result {
            Ok(view) => {
                info!(
                    lr_number = %view.booking.lr_number,
                    status = %view.booking.status,
                    "Booking status changed"
                );
                self.notifier.success(
                    &format!("{label} recorded"),
                    &format!(
                        "LR {} is now {}",
                        view.booking.lr_number,
                        view.booking.status.label()
                    ),
                );
                if let Err(e) = self.messenger.send_status_update_sms(view).await {
                    warn!(error = %e, lr_number = %view.booking.lr_number, "Status SMS not sent");
                }
            }
            Err(e) => self.notifier.error(&format!("{label} failed"), &e.to_string()),
        }
        result
    }

    async fn apply_transition<F>(
        &self,
        ctx: &QueryContext,
        id: &BookingId,
        change: F,
    ) -> Result<BookingView, AppError>
    where
        F: FnOnce(&mut Booking) -> Result<StatusUpdate, BookingError> + Send,
    {
        let mut booking = self.get(ctx, id).await?.booking;
        let update = change(&mut booking)?;
        Ok(self
            .store
            .update_booking_status(&ctx.organization_id, id, update)
            .await?)
    }

    async fn check_references(
        &self,
        ctx: &QueryContext,
        input: &CreateBookingInput,
    ) -> Result<(), AppError> {
        let org = &ctx.organization_id;
        let branches = self.store.list_branches(org).await?;
        for (field, id) in [("from_branch", &input.from_branch), ("to_branch", &input.to_branch)] {
            if !branches.iter().any(|b| &b.id == id) {
                return Err(AppError::validation(field, format!("unknown branch {id}")));
            }
        }
        let customers = self.store.list_customers(org).await?;
        for (field, id) in [("sender_id", &input.sender_id), ("receiver_id", &input.receiver_id)] {
            if !customers.iter().any(|c| &c.id == id) {
                return Err(AppError::validation(field, format!("unknown customer {id}")));
            }
        }
        Ok(())
    }
}

fn not_found(err: RepositoryError, id: &BookingId) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(format!("booking {id}")),
        other => other.into(),
    }
}
