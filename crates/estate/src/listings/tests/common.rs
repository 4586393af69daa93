use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::listings::domain::{
    ActionContext, Offer, OfferId, Property, PropertyDraft, PropertyId, PropertyType,
    PropertyTypeId, Tag, TagId, UserId,
};
use crate::listings::repository::{
    InMemoryListingRepository, ListingRepository, RepositoryError,
};
use crate::listings::{listing_router, ListingPolicy, ListingService};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn listed_at() -> NaiveDateTime {
    date(2024, 1, 1).and_hms_opt(9, 30, 0).expect("valid time")
}

pub(super) fn context() -> ActionContext {
    ActionContext::new(UserId(7), listed_at())
}

pub(super) fn build_service() -> (
    ListingService<InMemoryListingRepository>,
    Arc<InMemoryListingRepository>,
) {
    let repository = Arc::new(InMemoryListingRepository::default());
    let service = ListingService::new(repository.clone(), ListingPolicy::default());
    (service, repository)
}

pub(super) fn draft(name: &str, expected_price: f64) -> PropertyDraft {
    PropertyDraft {
        name: name.to_string(),
        description: Some("Bright home close to the park".to_string()),
        postcode: Some("1000".to_string()),
        expected_price,
        living_area: 120,
        facades: 4,
        garage: true,
        active: true,
        ..PropertyDraft::default()
    }
}

pub(super) fn listed_property(
    service: &ListingService<InMemoryListingRepository>,
    name: &str,
) -> Property {
    service
        .create_property(draft(name, 100_000.0), &context())
        .expect("property listed")
}

pub(super) struct UnavailableRepository;

impl UnavailableRepository {
    fn offline<T>() -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl ListingRepository for UnavailableRepository {
    fn insert_property(&self, _property: Property) -> Result<Property, RepositoryError> {
        Self::offline()
    }

    fn update_property(&self, _property: Property) -> Result<(), RepositoryError> {
        Self::offline()
    }

    fn fetch_property(&self, _id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        Self::offline()
    }

    fn properties(&self) -> Result<Vec<Property>, RepositoryError> {
        Self::offline()
    }

    fn modify_property<E, F>(&self, _id: PropertyId, _apply: F) -> Result<Property, E>
    where
        F: FnOnce(&mut Property) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        Ok(Self::offline()?)
    }

    fn insert_offer(&self, _offer: Offer) -> Result<Offer, RepositoryError> {
        Self::offline()
    }

    fn update_offer(&self, _offer: Offer) -> Result<(), RepositoryError> {
        Self::offline()
    }

    fn fetch_offer(&self, _id: OfferId) -> Result<Option<Offer>, RepositoryError> {
        Self::offline()
    }

    fn offers_for(&self, _property_id: PropertyId) -> Result<Vec<Offer>, RepositoryError> {
        Self::offline()
    }

    fn insert_property_type(
        &self,
        _property_type: PropertyType,
    ) -> Result<PropertyType, RepositoryError> {
        Self::offline()
    }

    fn fetch_property_type(
        &self,
        _id: PropertyTypeId,
    ) -> Result<Option<PropertyType>, RepositoryError> {
        Self::offline()
    }

    fn property_types(&self) -> Result<Vec<PropertyType>, RepositoryError> {
        Self::offline()
    }

    fn insert_tag(&self, _tag: Tag) -> Result<Tag, RepositoryError> {
        Self::offline()
    }

    fn fetch_tag(&self, _id: TagId) -> Result<Option<Tag>, RepositoryError> {
        Self::offline()
    }

    fn tags(&self) -> Result<Vec<Tag>, RepositoryError> {
        Self::offline()
    }
}

pub(super) fn router_with_service(
    service: ListingService<InMemoryListingRepository>,
) -> axum::Router {
    listing_router(Arc::new(service))
}

pub(super) fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("json body")))
        .expect("request builds")
}

pub(super) fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
