use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::identity::{authenticate, PrincipalProvider};

use super::domain::{Evidence, RequestId, ReviewOutcome, VerificationTarget};
use super::repository::{NotificationSender, TargetStore, VerificationRepository};
use super::service::{ModerationError, VerificationService};

pub struct ModerationRoutes<R, T, N, P> {
    pub service: Arc<VerificationService<R, T, N>>,
    pub principals: Arc<P>,
}

impl<R, T, N, P> Clone for ModerationRoutes<R, T, N, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            principals: self.principals.clone(),
        }
    }
}

/// Router builder exposing the verification workflow endpoints.
pub fn moderation_router<R, T, N, P>(state: ModerationRoutes<R, T, N, P>) -> Router
where
    R: VerificationRepository + 'static,
    T: TargetStore + 'static,
    N: NotificationSender + 'static,
    P: PrincipalProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/verifications",
            post(submit_handler::<R, T, N, P>).get(list_handler::<R, T, N, P>),
        )
        .route(
            "/api/v1/verifications/:request_id/approve",
            post(approve_handler::<R, T, N, P>),
        )
        .route(
            "/api/v1/verifications/:request_id/reject",
            post(reject_handler::<R, T, N, P>),
        )
        .route(
            "/api/v1/verifications/:request_id/whatsapp/start",
            post(whatsapp_start_handler::<R, T, N, P>),
        )
        .route(
            "/api/v1/verifications/:request_id/whatsapp/confirm",
            post(whatsapp_confirm_handler::<R, T, N, P>),
        )
        .with_state(state)
}

impl IntoResponse for ModerationError {
    fn into_response(self) -> Response {
        let status = match self {
            ModerationError::Validation(_)
            | ModerationError::SubmitterNotVerified
            | ModerationError::HostelNotVerified
            | ModerationError::OtpExpired
            | ModerationError::OtpMismatch => StatusCode::UNPROCESSABLE_ENTITY,
            ModerationError::Authorization(_) => StatusCode::FORBIDDEN,
            ModerationError::DuplicatePending(_)
            | ModerationError::AlreadyDecided
            | ModerationError::NoActiveChallenge => StatusCode::CONFLICT,
            ModerationError::RequestNotFound | ModerationError::TargetNotFound => {
                StatusCode::NOT_FOUND
            }
            ModerationError::Notification(_) => StatusCode::BAD_GATEWAY,
            ModerationError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SubmitPayload {
    target: VerificationTarget,
    evidence: Evidence,
}

#[derive(Debug, Deserialize, Default)]
struct DecisionPayload {
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WhatsappStartPayload {
    phone: String,
}

#[derive(Debug, Deserialize)]
struct WhatsappConfirmPayload {
    code: String,
}

async fn submit_handler<R, T, N, P>(
    State(state): State<ModerationRoutes<R, T, N, P>>,
    headers: HeaderMap,
    Json(payload): Json<SubmitPayload>,
) -> Result<Response, ModerationError>
where
    R: VerificationRepository + 'static,
    T: TargetStore + 'static,
    N: NotificationSender + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let request =
        state
            .service
            .submit(&principal, payload.target, payload.evidence, Utc::now())?;
    Ok((StatusCode::CREATED, Json(request.view())).into_response())
}

async fn list_handler<R, T, N, P>(
    State(state): State<ModerationRoutes<R, T, N, P>>,
    headers: HeaderMap,
) -> Result<Response, ModerationError>
where
    R: VerificationRepository + 'static,
    T: TargetStore + 'static,
    N: NotificationSender + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let requests = state.service.list_for(&principal)?;
    let views: Vec<_> = requests.iter().map(|request| request.view()).collect();
    Ok(Json(views).into_response())
}

async fn approve_handler<R, T, N, P>(
    State(state): State<ModerationRoutes<R, T, N, P>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    payload: Option<Json<DecisionPayload>>,
) -> Result<Response, ModerationError>
where
    R: VerificationRepository + 'static,
    T: TargetStore + 'static,
    N: NotificationSender + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let Json(payload) = payload.unwrap_or_default();
    let request = state.service.decide(
        &principal,
        &RequestId(request_id),
        ReviewOutcome::Approved,
        payload.notes,
        Utc::now(),
    )?;
    Ok(Json(request.view()).into_response())
}

async fn reject_handler<R, T, N, P>(
    State(state): State<ModerationRoutes<R, T, N, P>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    payload: Option<Json<DecisionPayload>>,
) -> Result<Response, ModerationError>
where
    R: VerificationRepository + 'static,
    T: TargetStore + 'static,
    N: NotificationSender + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let Json(payload) = payload.unwrap_or_default();
    let request = state.service.decide(
        &principal,
        &RequestId(request_id),
        ReviewOutcome::Rejected,
        payload.notes,
        Utc::now(),
    )?;
    Ok(Json(request.view()).into_response())
}

async fn whatsapp_start_handler<R, T, N, P>(
    State(state): State<ModerationRoutes<R, T, N, P>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    Json(payload): Json<WhatsappStartPayload>,
) -> Result<Response, ModerationError>
where
    R: VerificationRepository + 'static,
    T: TargetStore + 'static,
    N: NotificationSender + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let link = state.service.start_phone_challenge(
        &principal,
        &RequestId(request_id),
        &payload.phone,
        Utc::now(),
    )?;
    Ok(Json(json!({ "whatsapp_link": link })).into_response())
}

async fn whatsapp_confirm_handler<R, T, N, P>(
    State(state): State<ModerationRoutes<R, T, N, P>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
    Json(payload): Json<WhatsappConfirmPayload>,
) -> Result<Response, ModerationError>
where
    R: VerificationRepository + 'static,
    T: TargetStore + 'static,
    N: NotificationSender + 'static,
    P: PrincipalProvider + 'static,
{
    let principal = authenticate(state.principals.as_ref(), &headers)?;
    let request = state.service.confirm_phone_challenge(
        &principal,
        &RequestId(request_id),
        &payload.code,
        Utc::now(),
    )?;
    Ok(Json(request.view()).into_response())
}
