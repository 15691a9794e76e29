use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::catalog::{HostelId, ListingStore};
use crate::identity::{authenticate, PrincipalProvider};

use super::domain::{InteractionKind, ReviewId, SummaryPeriod};
use super::repository::{AnalyticsRepository, EngagementStore};
use super::service::{EngagementError, EngagementService};

pub struct EngagementRoutes<L, E, A, P> {
    pub service: Arc<EngagementService<L, E, A>>,
    pub principals: Arc<P>,
}

impl<L, E, A, P> Clone for EngagementRoutes<L, E, A, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            principals: self.principals.clone(),
        }
    }
}

/// Router builder for favorites, reviews, interactions, and analytics.
pub fn engagement_router<L, E, A, P>(state: EngagementRoutes<L, E, A, P>) -> Router
where
    L: ListingStore + 'static,
    E: EngagementStore + 'static,
    A: AnalyticsRepository + 'static,
    P: PrincipalProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/favorites",
            post(add_favorite_handler::<L, E, A, P>).get(list_favorites_handler::<L, E, A, P>),
        )
        .route(
            "/api/v1/favorites/:hostel_id",
            axum::routing::delete(remove_favorite_handler::<L, E, A, P>),
        )
        .route("/api/v1/reviews", post(add_review_handler::<L, E, A, P>))
        .route(
            "/api/v1/reviews/:review_id",
            axum::routing::patch(update_review_handler::<L, E, A, P>)
                .delete(delete_review_handler::<L, E, A, P>),
        )
        .route(
            "/api/v1/hostels/:hostel_id/reviews",
            get(list_reviews_handler::<L, E, A, P>),
        )
        .route(
            "/api/v1/interactions",
            post(record_interaction_handler::<L, E, A, P>),
        )
        .route(
            "/api/v1/hostels/:hostel_id/analytics",
            get(analytics_overview_handler::<L, E, A, P>),
        )
        .route(
            "/api/v1/hostels/:hostel_id/analytics/summaries",
            post(generate_summary_handler::<L, E, A, P>),
        )
        .with_state(state)
}

impl IntoResponse for EngagementError {
    fn into_response(self) -> Response {
        let status = match self {
            EngagementError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngagementError::Authorization(_) => StatusCode::FORBIDDEN,
            EngagementError::DuplicateFavorite | EngagementError::DuplicateReview => {
                StatusCode::CONFLICT
            }
            EngagementError::HostelNotFound
            | EngagementError::FavoriteNotFound
            | EngagementError::ReviewNotFound => StatusCode::NOT_FOUND,
            EngagementError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct FavoritePayload {
    hostel_id: u64,
}

#[derive(Debug, Deserialize)]
struct ReviewPayload {
    hostel_id: u64,
    rating: u8,
    comment: String,
}

#[derive(Debug, Deserialize)]
struct ReviewUpdatePayload {
    rating: u8,
    comment: String,
}

#[derive(Debug, Deserialize)]
struct InteractionPayload {
    hostel_id: u64,
    kind: InteractionKind,
    #[serde(default)]
    safety_confirmed: bool,
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    period: SummaryPeriod,
    start_date: NaiveDate,
}

async fn add_favorite_handler<L, E, A, P>(
    State(state): State<EngagementRoutes<L, E, A, P>>,
    headers: HeaderMap,
    Json(payload): Json<FavoritePayload>,
) -> Result<Response, EngagementError>
where
    L: ListingStore + 'static,
    E: EngagementStore + 'static,
    A: AnalyticsRepository + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let favorite =
        state
            .service
            .add_favorite(&principal, HostelId(payload.hostel_id), Utc::now())?;
    Ok((StatusCode::CREATED, Json(favorite)).into_response())
}

async fn list_favorites_handler<L, E, A, P>(
    State(state): State<EngagementRoutes<L, E, A, P>>,
    headers: HeaderMap,
) -> Result<Response, EngagementError>
where
    L: ListingStore + 'static,
    E: EngagementStore + 'static,
    A: AnalyticsRepository + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let favorites = state.service.favorites_for(&principal)?;
    Ok(Json(favorites).into_response())
}

async fn remove_favorite_handler<L, E, A, P>(
    State(state): State<EngagementRoutes<L, E, A, P>>,
    headers: HeaderMap,
    Path(hostel_id): Path<u64>,
) -> Result<Response, EngagementError>
where
    L: ListingStore + 'static,
    E: EngagementStore + 'static,
    A: AnalyticsRepository + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    state
        .service
        .remove_favorite(&principal, HostelId(hostel_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn add_review_handler<L, E, A, P>(
    State(state): State<EngagementRoutes<L, E, A, P>>,
    headers: HeaderMap,
    Json(payload): Json<ReviewPayload>,
) -> Result<Response, EngagementError>
where
    L: ListingStore + 'static,
    E: EngagementStore + 'static,
    A: AnalyticsRepository + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let review = state.service.add_review(
        &principal,
        HostelId(payload.hostel_id),
        payload.rating,
        payload.comment,
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(review)).into_response())
}

async fn update_review_handler<L, E, A, P>(
    State(state): State<EngagementRoutes<L, E, A, P>>,
    headers: HeaderMap,
    Path(review_id): Path<u64>,
    Json(payload): Json<ReviewUpdatePayload>,
) -> Result<Response, EngagementError>
where
    L: ListingStore + 'static,
    E: EngagementStore + 'static,
    A: AnalyticsRepository + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let review = state.service.update_review(
        &principal,
        ReviewId(review_id),
        payload.rating,
        payload.comment,
    )?;
    Ok(Json(review).into_response())
}

async fn delete_review_handler<L, E, A, P>(
    State(state): State<EngagementRoutes<L, E, A, P>>,
    headers: HeaderMap,
    Path(review_id): Path<u64>,
) -> Result<Response, EngagementError>
where
    L: ListingStore + 'static,
    E: EngagementStore + 'static,
    A: AnalyticsRepository + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    state.service.delete_review(&principal, ReviewId(review_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn list_reviews_handler<L, E, A, P>(
    State(state): State<EngagementRoutes<L, E, A, P>>,
    Path(hostel_id): Path<u64>,
) -> Result<Response, EngagementError>
where
    L: ListingStore + 'static,
    E: EngagementStore + 'static,
    A: AnalyticsRepository + 'static,
    P: PrincipalProvider + 'static,
{
    let view = state.service.reviews_for(HostelId(hostel_id))?;
    Ok(Json(view).into_response())
}

async fn record_interaction_handler<L, E, A, P>(
    State(state): State<EngagementRoutes<L, E, A, P>>,
    headers: HeaderMap,
    Json(payload): Json<InteractionPayload>,
) -> Result<Response, EngagementError>
where
    L: ListingStore + 'static,
    E: EngagementStore + 'static,
    A: AnalyticsRepository + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    state.service.record_interaction(
        &principal,
        HostelId(payload.hostel_id),
        payload.kind,
        payload.safety_confirmed,
        Utc::now(),
    )?;
    Ok(StatusCode::ACCEPTED.into_response())
}

async fn analytics_overview_handler<L, E, A, P>(
    State(state): State<EngagementRoutes<L, E, A, P>>,
    headers: HeaderMap,
    Path(hostel_id): Path<u64>,
) -> Result<Response, EngagementError>
where
    L: ListingStore + 'static,
    E: EngagementStore + 'static,
    A: AnalyticsRepository + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let overview = state.service.analytics_overview(
        &principal,
        HostelId(hostel_id),
        Utc::now().date_naive(),
    )?;
    Ok(Json(overview).into_response())
}

async fn generate_summary_handler<L, E, A, P>(
    State(state): State<EngagementRoutes<L, E, A, P>>,
    headers: HeaderMap,
    Path(hostel_id): Path<u64>,
    Json(payload): Json<SummaryPayload>,
) -> Result<Response, EngagementError>
where
    L: ListingStore + 'static,
    E: EngagementStore + 'static,
    A: AnalyticsRepository + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let summary = state.service.generate_summary(
        &principal,
        HostelId(hostel_id),
        payload.period,
        payload.start_date,
    )?;
    Ok(Json(summary).into_response())
}
