use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json, Router};
use serde_json::json;

use hostel_finder::catalog::{catalog_router, CatalogRoutes, CatalogService};
use hostel_finder::engagement::{
    engagement_router, AnalyticsService, EngagementRoutes, EngagementService,
};
use hostel_finder::error::RepositoryError;
use hostel_finder::identity::{authenticate, IdentityError};
use hostel_finder::moderation::{
    moderation_router, ModerationRoutes, VerificationService, VerificationTarget,
};
use hostel_finder::search::{search_router, SearchRoutes, SearchService};

use crate::infra::{AppState, InMemoryStore, LoggingNotifier, ProfileUpdate};

pub(crate) type Db = InMemoryStore;
pub(crate) type Verification = VerificationService<Db, Db, LoggingNotifier>;
pub(crate) type Analytics = AnalyticsService<Db, Db>;
pub(crate) type Engagement = EngagementService<Db, Db, Db>;
pub(crate) type Catalog = CatalogService<Db, Verification>;
pub(crate) type Search = SearchService<Db, Analytics>;

/// Every service wired over the shared in-memory store.
pub(crate) struct ApiContext {
    pub(crate) store: Arc<Db>,
    pub(crate) verification: Arc<Verification>,
    pub(crate) analytics: Arc<Analytics>,
    pub(crate) engagement: Arc<Engagement>,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) search: Arc<Search>,
}

impl ApiContext {
    pub(crate) fn new(store: Arc<Db>) -> Self {
        let notifier = Arc::new(LoggingNotifier::default());
        let verification = Arc::new(VerificationService::new(
            store.clone(),
            store.clone(),
            notifier.clone(),
        ));
        let analytics = Arc::new(AnalyticsService::new(store.clone(), store.clone()));
        let engagement = Arc::new(EngagementService::new(
            store.clone(),
            store.clone(),
            analytics.clone(),
        ));
        let catalog = Arc::new(CatalogService::new(store.clone(), verification.clone()));
        let search = Arc::new(SearchService::new(store.clone(), analytics.clone()));

        Self {
            store,
            verification,
            analytics,
            engagement,
            catalog,
            search,
        }
    }
}

struct ProfileRoutes {
    store: Arc<Db>,
    verification: Arc<Verification>,
}

impl Clone for ProfileRoutes {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            verification: self.verification.clone(),
        }
    }
}

/// Compose every module router plus the operational endpoints.
pub(crate) fn build_router(context: &ApiContext) -> Router {
    let profile_state = ProfileRoutes {
        store: context.store.clone(),
        verification: context.verification.clone(),
    };

    Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .merge(search_router(SearchRoutes {
            service: context.search.clone(),
            principals: context.store.clone(),
        }))
        .merge(catalog_router(CatalogRoutes {
            service: context.catalog.clone(),
            principals: context.store.clone(),
        }))
        .merge(engagement_router(EngagementRoutes {
            service: context.engagement.clone(),
            principals: context.store.clone(),
        }))
        .merge(moderation_router(ModerationRoutes {
            service: context.verification.clone(),
            principals: context.store.clone(),
        }))
        .merge(
            Router::new()
                .route(
                    "/api/v1/profile",
                    axum::routing::patch(update_profile_endpoint),
                )
                .with_state(profile_state),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Identity-provider glue: apply the profile patch, then feed the diff into
/// the verification workflow so an approved user verification covering those
/// fields is demoted.
async fn update_profile_endpoint(
    State(state): State<ProfileRoutes>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    let principal = match authenticate(state.store.as_ref(), &headers) {
        Ok(principal) => principal,
        Err(IdentityError::Authorization(err)) => {
            return (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
        Err(IdentityError::Store(err)) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    };

    let (updated, changed) = match state.store.update_profile(principal.id, update) {
        Ok(result) => result,
        Err(RepositoryError::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "profile not found" })),
            )
                .into_response()
        }
        Err(other) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": other.to_string() })),
            )
                .into_response()
        }
    };

    if !changed.is_empty() {
        if let Err(err) = state
            .verification
            .entity_changed(VerificationTarget::User(principal.id), &changed)
        {
            return err.into_response();
        }
    }

    (StatusCode::OK, Json(updated)).into_response()
}
