use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;

use crate::catalog::ListingStore;
use crate::identity::{authenticate_optional, PrincipalProvider};

use super::domain::{RawSearchParams, SearchQuery};
use super::service::{SearchError, SearchEventSink, SearchService};

pub struct SearchRoutes<L, E, P> {
    pub service: Arc<SearchService<L, E>>,
    pub principals: Arc<P>,
}

impl<L, E, P> Clone for SearchRoutes<L, E, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            principals: self.principals.clone(),
        }
    }
}

/// Router builder exposing the geo search endpoint.
pub fn search_router<L, E, P>(state: SearchRoutes<L, E, P>) -> Router
where
    L: ListingStore + 'static,
    E: SearchEventSink + 'static,
    P: PrincipalProvider + 'static,
{
    Router::new()
        .route("/api/v1/search", get(search_handler::<L, E, P>))
        .with_state(state)
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = match self {
            SearchError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SearchError::Authorization(_) => StatusCode::FORBIDDEN,
            SearchError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

async fn search_handler<L, E, P>(
    State(state): State<SearchRoutes<L, E, P>>,
    headers: HeaderMap,
    Query(params): Query<RawSearchParams>,
) -> Result<Response, SearchError>
where
    L: ListingStore + 'static,
    E: SearchEventSink + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate_optional(state.principals.as_ref(), &headers)?;
    let query = SearchQuery::parse(&params)?;
    let results = state
        .service
        .search(principal.map(|p| p.id), &query, Utc::now())?;
    Ok(Json(results).into_response())
}
