use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::identity::{authenticate, PrincipalProvider};
use crate::moderation::repository::ChangeObserver;

use super::domain::{HostelDraft, HostelId, RoomDraft, RoomId};
use super::repository::ListingStore;
use super::service::{CatalogError, CatalogService};

pub struct CatalogRoutes<L, O, P> {
    pub service: Arc<CatalogService<L, O>>,
    pub principals: Arc<P>,
}

impl<L, O, P> Clone for CatalogRoutes<L, O, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            principals: self.principals.clone(),
        }
    }
}

/// Router builder for listing and room maintenance.
pub fn catalog_router<L, O, P>(state: CatalogRoutes<L, O, P>) -> Router
where
    L: ListingStore + 'static,
    O: ChangeObserver + 'static,
    P: PrincipalProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/hostels",
            post(create_hostel_handler::<L, O, P>).get(list_hostels_handler::<L, O, P>),
        )
        .route(
            "/api/v1/hostels/:hostel_id",
            get(hostel_detail_handler::<L, O, P>)
                .patch(update_hostel_handler::<L, O, P>)
                .delete(delete_hostel_handler::<L, O, P>),
        )
        .route(
            "/api/v1/hostels/:hostel_id/rooms",
            post(add_room_handler::<L, O, P>),
        )
        .route(
            "/api/v1/rooms/:room_id",
            axum::routing::patch(update_room_handler::<L, O, P>)
                .delete(delete_room_handler::<L, O, P>),
        )
        .with_state(state)
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = match self {
            CatalogError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CatalogError::Authorization(_) => StatusCode::FORBIDDEN,
            CatalogError::HostelNotFound | CatalogError::RoomNotFound => StatusCode::NOT_FOUND,
            CatalogError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

async fn create_hostel_handler<L, O, P>(
    State(state): State<CatalogRoutes<L, O, P>>,
    headers: HeaderMap,
    Json(draft): Json<HostelDraft>,
) -> Result<Response, CatalogError>
where
    L: ListingStore + 'static,
    O: ChangeObserver + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let hostel = state.service.create_hostel(&principal, draft, Utc::now())?;
    Ok((StatusCode::CREATED, Json(hostel)).into_response())
}

async fn list_hostels_handler<L, O, P>(
    State(state): State<CatalogRoutes<L, O, P>>,
) -> Result<Response, CatalogError>
where
    L: ListingStore + 'static,
    O: ChangeObserver + 'static,
    P: PrincipalProvider + 'static,
{
    let hostels = state.service.list_hostels()?;
    Ok(Json(hostels).into_response())
}

async fn hostel_detail_handler<L, O, P>(
    State(state): State<CatalogRoutes<L, O, P>>,
    Path(hostel_id): Path<u64>,
) -> Result<Response, CatalogError>
where
    L: ListingStore + 'static,
    O: ChangeObserver + 'static,
    P: PrincipalProvider + 'static,
{
    let (hostel, rooms) = state.service.hostel_detail(HostelId(hostel_id))?;
    Ok(Json(serde_json::json!({ "hostel": hostel, "rooms": rooms })).into_response())
}

async fn update_hostel_handler<L, O, P>(
    State(state): State<CatalogRoutes<L, O, P>>,
    headers: HeaderMap,
    Path(hostel_id): Path<u64>,
    Json(draft): Json<HostelDraft>,
) -> Result<Response, CatalogError>
where
    L: ListingStore + 'static,
    O: ChangeObserver + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let hostel = state
        .service
        .update_hostel(&principal, HostelId(hostel_id), draft)?;
    Ok(Json(hostel).into_response())
}

async fn delete_hostel_handler<L, O, P>(
    State(state): State<CatalogRoutes<L, O, P>>,
    headers: HeaderMap,
    Path(hostel_id): Path<u64>,
) -> Result<Response, CatalogError>
where
    L: ListingStore + 'static,
    O: ChangeObserver + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    state.service.delete_hostel(&principal, HostelId(hostel_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn add_room_handler<L, O, P>(
    State(state): State<CatalogRoutes<L, O, P>>,
    headers: HeaderMap,
    Path(hostel_id): Path<u64>,
    Json(draft): Json<RoomDraft>,
) -> Result<Response, CatalogError>
where
    L: ListingStore + 'static,
    O: ChangeObserver + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let room = state
        .service
        .add_room(&principal, HostelId(hostel_id), draft, Utc::now())?;
    Ok((StatusCode::CREATED, Json(room)).into_response())
}

async fn update_room_handler<L, O, P>(
    State(state): State<CatalogRoutes<L, O, P>>,
    headers: HeaderMap,
    Path(room_id): Path<u64>,
    Json(draft): Json<RoomDraft>,
) -> Result<Response, CatalogError>
where
    L: ListingStore + 'static,
    O: ChangeObserver + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let room = state
        .service
        .update_room(&principal, RoomId(room_id), draft)?;
    Ok(Json(room).into_response())
}

async fn delete_room_handler<L, O, P>(
    State(state): State<CatalogRoutes<L, O, P>>,
    headers: HeaderMap,
    Path(room_id): Path<u64>,
) -> Result<Response, CatalogError>
where
    L: ListingStore + 'static,
    O: ChangeObserver + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    state.service.delete_room(&principal, RoomId(room_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
