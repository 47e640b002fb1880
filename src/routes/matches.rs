use actix_web::{web, HttpRequest, HttpResponse, Responder};
use crate::models::{HealthResponse, MatchListResponse, MatchView, SetMatchStatusRequest};
use crate::routes::{actor_context, error_response, AppState};
use crate::services::CacheKey;

/// Configure health and match routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches", web::get().to(list_matches))
        .route("/matches/{id}/status", web::post().to(set_match_status));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = match state.store.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: state.store.backend().to_string(),
        cache: state.cache.stats(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /api/v1/matches
///
/// Matches involving any of the caller's animals, best score first, with
/// both animals attached.
async fn list_matches(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let ctx = match actor_context(&state, &req) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    let actor_id = match ctx.require_actor() {
        Ok(actor) => actor.id.clone(),
        Err(e) => return error_response(&e),
    };

    let cache_key = CacheKey::matches(&actor_id);
    if let Ok(matches) = state.cache.get::<Vec<MatchView>>(&cache_key).await {
        tracing::debug!("Serving {} cached matches for {}", matches.len(), actor_id);
        return HttpResponse::Ok().json(MatchListResponse {
            total_results: matches.len(),
            matches,
        });
    }

    match state.lifecycle.list_matches(&ctx).await {
        Ok(matches) => {
            if let Err(e) = state.cache.set(&cache_key, &matches).await {
                tracing::warn!("Failed to cache matches for {}: {}", actor_id, e);
            }

            HttpResponse::Ok().json(MatchListResponse {
                total_results: matches.len(),
                matches,
            })
        }
        Err(e) => error_response(&e),
    }
}

/// POST /api/v1/matches/{id}/status
///
/// Request body:
/// ```json
/// { "status": "accepted" }
/// ```
async fn set_match_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SetMatchStatusRequest>,
    req: HttpRequest,
) -> impl Responder {
    let ctx = match actor_context(&state, &req) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match state.lifecycle.set_match_status(&ctx, &path, body.status).await {
        Ok(outcome) => {
            state.cache.invalidate_matches(&outcome.affected_owners).await;
            HttpResponse::Ok().json(outcome.updated)
        }
        Err(e) => error_response(&e),
    }
}
