//! Domain records.
//!
//! Persisted shapes plus the create/update inputs that produce them. Every
//! mutation validates first and leaves the record untouched on error.

pub mod article;
pub mod booking;
pub mod branch;
pub mod customer;
pub mod ogpl;

pub use article::{Article, ArticleError, CreateArticleInput, CustomerRate, UpdateArticleInput};
pub use booking::{
    Booking, BookingError, BookingView, BranchRef, CreateBookingInput, PartyRef, ProofOfDelivery,
    StatusUpdate, UpdateBookingInput,
};
pub use branch::Branch;
pub use customer::{Customer, CustomerType};
pub use ogpl::{
    CreateOgplInput, LoadingRecord, Ogpl, OgplError, UnloadingEntry, UnloadingRecord,
};
