use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ActionContext, OfferDraft, OfferId, OfferPatch, PropertyDraft, PropertyId, PropertyPatch,
    PropertyQuery, SaleTerms, UserId,
};
use super::lifecycle::LifecycleAction;
use super::repository::{ListingRepository, RepositoryError};
use super::service::{ListingService, ListingServiceError};

/// Header carrying the acting user's id. Requests without it act as the administrator.
pub const ACTING_USER_HEADER: &str = "x-user-id";

#[derive(Debug, Deserialize)]
pub(crate) struct NamePayload {
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchPayload {
    ids: Vec<PropertyId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GardenPayload {
    garden: bool,
}

/// Router builder exposing HTTP endpoints for listings, offers and lookup tables.
pub fn listing_router<R>(service: Arc<ListingService<R>>) -> Router
where
    R: ListingRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/estate/properties",
            post(create_property_handler::<R>).get(search_properties_handler::<R>),
        )
        .route(
            "/api/v1/estate/properties/:property_id",
            get(property_handler::<R>).patch(update_property_handler::<R>),
        )
        .route(
            "/api/v1/estate/properties/:property_id/duplicate",
            post(duplicate_property_handler::<R>),
        )
        .route(
            "/api/v1/estate/properties/:property_id/sale",
            post(record_sale_handler::<R>),
        )
        .route(
            "/api/v1/estate/properties/:property_id/mark-sold",
            post(mark_sold_handler::<R>),
        )
        .route(
            "/api/v1/estate/properties/:property_id/mark-canceled",
            post(mark_canceled_handler::<R>),
        )
        .route(
            "/api/v1/estate/properties/actions/sold",
            post(batch_mark_sold_handler::<R>),
        )
        .route(
            "/api/v1/estate/properties/actions/cancel",
            post(batch_mark_canceled_handler::<R>),
        )
        .route(
            "/api/v1/estate/properties/garden-assist",
            post(garden_assist_handler::<R>),
        )
        .route("/api/v1/estate/offers", post(create_offer_handler::<R>))
        .route(
            "/api/v1/estate/offers/:offer_id",
            get(offer_handler::<R>).patch(update_offer_handler::<R>),
        )
        .route(
            "/api/v1/estate/property-types",
            post(create_property_type_handler::<R>).get(property_types_handler::<R>),
        )
        .route(
            "/api/v1/estate/tags",
            post(create_tag_handler::<R>).get(tags_handler::<R>),
        )
        .with_state(service)
}

fn action_context(headers: &HeaderMap) -> ActionContext {
    let user = headers
        .get(ACTING_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map_or(UserId::ADMINISTRATOR, UserId);
    ActionContext::new(user, Local::now().naive_local())
}

pub(crate) fn error_response(error: ListingServiceError) -> Response {
    let status = match &error {
        ListingServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ListingServiceError::Lifecycle(_) => StatusCode::CONFLICT,
        ListingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ListingServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ListingServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}

fn respond<T, F>(result: Result<T, ListingServiceError>, status: StatusCode, view: F) -> Response
where
    F: FnOnce(T) -> Response,
{
    match result {
        Ok(value) => {
            let mut response = view(value);
            *response.status_mut() = status;
            response
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_property_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    headers: HeaderMap,
    Json(draft): Json<PropertyDraft>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let ctx = action_context(&headers);
    let result = service
        .create_property(draft, &ctx)
        .and_then(|property| service.property_view(property.id));
    respond(result, StatusCode::CREATED, |view| Json(view).into_response())
}

pub(crate) async fn search_properties_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Query(query): Query<PropertyQuery>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let result = service.search_properties(query).and_then(|properties| {
        properties
            .into_iter()
            .map(|property| service.property_view(property.id))
            .collect::<Result<Vec<_>, _>>()
    });
    respond(result, StatusCode::OK, |views| Json(views).into_response())
}

pub(crate) async fn property_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(property_id): Path<u64>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let result = service.property_view(PropertyId(property_id));
    respond(result, StatusCode::OK, |view| Json(view).into_response())
}

pub(crate) async fn update_property_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(property_id): Path<u64>,
    Json(patch): Json<PropertyPatch>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let id = PropertyId(property_id);
    let result = service
        .update_property(id, patch)
        .and_then(|_| service.property_view(id));
    respond(result, StatusCode::OK, |view| Json(view).into_response())
}

pub(crate) async fn duplicate_property_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    headers: HeaderMap,
    Path(property_id): Path<u64>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let ctx = action_context(&headers);
    let result = service
        .duplicate_property(PropertyId(property_id), &ctx)
        .and_then(|copy| service.property_view(copy.id));
    respond(result, StatusCode::CREATED, |view| Json(view).into_response())
}

pub(crate) async fn record_sale_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(property_id): Path<u64>,
    Json(terms): Json<SaleTerms>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let id = PropertyId(property_id);
    let result = service
        .record_sale(id, terms)
        .and_then(|_| service.property_view(id));
    respond(result, StatusCode::OK, |view| Json(view).into_response())
}

async fn single_action<R>(
    service: Arc<ListingService<R>>,
    property_id: u64,
    action: LifecycleAction,
) -> Response
where
    R: ListingRepository + 'static,
{
    let id = PropertyId(property_id);
    let result = service
        .apply_action(id, action)
        .and_then(|_| service.property_view(id));
    respond(result, StatusCode::OK, |view| Json(view).into_response())
}

pub(crate) async fn mark_sold_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(property_id): Path<u64>,
) -> Response
where
    R: ListingRepository + 'static,
{
    single_action(service, property_id, LifecycleAction::MarkSold).await
}

pub(crate) async fn mark_canceled_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(property_id): Path<u64>,
) -> Response
where
    R: ListingRepository + 'static,
{
    single_action(service, property_id, LifecycleAction::MarkCanceled).await
}

pub(crate) async fn batch_mark_sold_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Json(payload): Json<BatchPayload>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let outcome = service.mark_sold(&payload.ids);
    (StatusCode::OK, Json(outcome)).into_response()
}

pub(crate) async fn batch_mark_canceled_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Json(payload): Json<BatchPayload>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let outcome = service.mark_canceled(&payload.ids);
    (StatusCode::OK, Json(outcome)).into_response()
}

pub(crate) async fn garden_assist_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Json(payload): Json<GardenPayload>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let assist = service.garden_assist(payload.garden);
    (StatusCode::OK, Json(assist)).into_response()
}

pub(crate) async fn create_offer_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    headers: HeaderMap,
    Json(draft): Json<OfferDraft>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let ctx = action_context(&headers);
    let result = service.create_offer(draft, &ctx);
    respond(result, StatusCode::CREATED, |view| Json(view).into_response())
}

pub(crate) async fn offer_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(offer_id): Path<u64>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let today = Local::now().date_naive();
    let result = service.offer_view(OfferId(offer_id), today);
    respond(result, StatusCode::OK, |view| Json(view).into_response())
}

pub(crate) async fn update_offer_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(offer_id): Path<u64>,
    Json(patch): Json<OfferPatch>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let today = Local::now().date_naive();
    let result = service.update_offer(OfferId(offer_id), patch, today);
    respond(result, StatusCode::OK, |view| Json(view).into_response())
}

pub(crate) async fn create_property_type_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Json(payload): Json<NamePayload>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let result = service.create_property_type(payload.name);
    respond(result, StatusCode::CREATED, |created| {
        Json(created).into_response()
    })
}

pub(crate) async fn property_types_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
) -> Response
where
    R: ListingRepository + 'static,
{
    respond(service.property_types(), StatusCode::OK, |types| {
        Json(types).into_response()
    })
}

pub(crate) async fn create_tag_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Json(payload): Json<NamePayload>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let result = service.create_tag(payload.name);
    respond(result, StatusCode::CREATED, |created| {
        Json(created).into_response()
    })
}

pub(crate) async fn tags_handler<R>(State(service): State<Arc<ListingService<R>>>) -> Response
where
    R: ListingRepository + 'static,
{
    respond(service.tags(), StatusCode::OK, |tags| Json(tags).into_response())
}
