//! Property listings, offers, and the rules that keep them consistent.
//!
//! Derived figures (total area, best price, offer deadline) are plain functions evaluated by
//! the service whenever their inputs are written. The lifecycle guard and price validation run
//! before anything reaches the repository.

pub mod aggregation;
pub mod deadline;
pub mod domain;
mod garden;
pub mod lifecycle;
mod policy;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;
mod views;

#[cfg(test)]
mod tests;

pub use aggregation::{compute_best_price, compute_total_area};
pub use deadline::{deadline_from_validity, validity_from_deadline};
pub use domain::{
    ActionContext, GardenOrientation, Offer, OfferDraft, OfferId, OfferPatch, OfferStatus,
    PartnerId, Property, PropertyDraft, PropertyId, PropertyPatch, PropertyQuery, PropertyState,
    PropertyType, PropertyTypeId, SaleTerms, Tag, TagId, UserId,
};
pub use garden::{garden_assist, FormWarning, GardenAssist};
pub use lifecycle::{
    mark_canceled, mark_sold, ActionOutcome, BatchOutcome, LifecycleAction, LifecycleError,
};
pub use policy::ListingPolicy;
pub use repository::{InMemoryListingRepository, ListingRepository, RepositoryError};
pub use router::listing_router;
pub use service::{ListingService, ListingServiceError};
pub use validation::{validate_prices, ValidationError};
pub use views::{OfferView, PropertyView};
