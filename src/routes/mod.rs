// Route exports
pub mod animals;
pub mod matches;
pub mod welfare;

use crate::core::{ActorContext, CoreError, MatchLifecycle, Registry, WelfareDesk};
use crate::models::{ErrorResponse, MatchPolicy, ScoringWeights};
use crate::services::{CacheManager, DataStore, SessionVerifier};
use actix_web::{error, http::header, http::StatusCode, web, HttpRequest, HttpResponse};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub lifecycle: MatchLifecycle,
    pub registry: Registry,
    pub welfare: WelfareDesk,
    pub cache: Arc<CacheManager>,
    pub sessions: Arc<SessionVerifier>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DataStore>,
        weights: ScoringWeights,
        policy: MatchPolicy,
        cache: Arc<CacheManager>,
        sessions: Arc<SessionVerifier>,
    ) -> Self {
        Self {
            lifecycle: MatchLifecycle::new(store.clone(), weights, policy),
            registry: Registry::new(store.clone()),
            welfare: WelfareDesk::new(store.clone()),
            store,
            cache,
            sessions,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(animals::configure)
            .configure(welfare::configure),
    );
}

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(ErrorResponse {
                error: self.error.clone(),
                message: self.message.clone(),
                status_code: self.status_code,
            })
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Resolve the caller from the `Authorization` header
///
/// An absent header is an anonymous caller. A header that does not carry a
/// valid bearer token is answered with 401 straight away.
pub(crate) fn actor_context(state: &AppState, req: &HttpRequest) -> Result<ActorContext, HttpResponse> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default());

    state.sessions.context_from_header(header).map_err(|e| {
        tracing::info!("Rejected credentials on {}: {}", req.path(), e);
        HttpResponse::Unauthorized().json(ErrorResponse {
            error: "invalid_token".to_string(),
            message: e.to_string(),
            status_code: 401,
        })
    })
}

/// Map a core failure onto its HTTP status and JSON body
pub(crate) fn error_response(err: &CoreError) -> HttpResponse {
    let (status, code) = match err {
        CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        CoreError::AccessDenied(_) => (StatusCode::FORBIDDEN, "access_denied"),
        CoreError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
        CoreError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
        CoreError::DataAccess(e) => {
            tracing::error!("Data access failure: {}", e);
            (StatusCode::BAD_GATEWAY, "data_access_failed")
        }
    };

    HttpResponse::build(status).json(ErrorResponse {
        error: code.to_string(),
        message: err.to_string(),
        status_code: status.as_u16(),
    })
}
