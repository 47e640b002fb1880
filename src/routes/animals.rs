use actix_web::{web, HttpRequest, HttpResponse, Responder};
use crate::models::{AnimalUpdate, DeletedResponse, DiscoverMatchesResponse, NewAnimal};
use crate::routes::{actor_context, error_response, AppState};
use crate::services::CacheKey;

/// Configure registry and discovery routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .service(
            web::resource("/animals")
                .route(web::get().to(list_animals))
                .route(web::post().to(create_animal)),
        )
        .route("/animals/mine", web::get().to(list_owned))
        .service(
            web::resource("/animals/{id}")
                .route(web::get().to(get_animal))
                .route(web::patch().to(update_animal))
                .route(web::delete().to(delete_animal)),
        )
        .route("/animals/{id}/matches", web::post().to(discover_matches));
}

/// GET /api/v1/animals
async fn list_animals(state: web::Data<AppState>) -> impl Responder {
    match state.registry.list_animals().await {
        Ok(animals) => HttpResponse::Ok().json(animals),
        Err(e) => error_response(&e),
    }
}

/// GET /api/v1/animals/mine
async fn list_owned(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let ctx = match actor_context(&state, &req) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match state.registry.list_owned(&ctx).await {
        Ok(animals) => HttpResponse::Ok().json(animals),
        Err(e) => error_response(&e),
    }
}

/// GET /api/v1/animals/{id}
async fn get_animal(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.registry.get_animal(&path).await {
        Ok(animal) => HttpResponse::Ok().json(animal),
        Err(e) => error_response(&e),
    }
}

/// POST /api/v1/animals
///
/// Request body:
/// ```json
/// {
///   "name": "Radha",
///   "breed": "Gir",
///   "age": 4,
///   "gender": "female",
///   "health_status": "healthy",
///   "milk_production": 18.0
/// }
/// ```
async fn create_animal(
    state: web::Data<AppState>,
    body: web::Json<NewAnimal>,
    req: HttpRequest,
) -> impl Responder {
    let ctx = match actor_context(&state, &req) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match state.registry.create_animal(&ctx, body.into_inner()).await {
        Ok(animal) => {
            state.cache.delete(&CacheKey::matches(&animal.owner_id)).await;
            HttpResponse::Created().json(animal)
        }
        Err(e) => error_response(&e),
    }
}

/// PATCH /api/v1/animals/{id}
async fn update_animal(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<AnimalUpdate>,
    req: HttpRequest,
) -> impl Responder {
    let ctx = match actor_context(&state, &req) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match state.registry.update_animal(&ctx, &path, body.into_inner()).await {
        Ok(animal) => {
            state.cache.delete(&CacheKey::matches(&animal.owner_id)).await;
            HttpResponse::Ok().json(animal)
        }
        Err(e) => error_response(&e),
    }
}

/// DELETE /api/v1/animals/{id}
async fn delete_animal(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> impl Responder {
    let ctx = match actor_context(&state, &req) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    let id = path.into_inner();
    match state.registry.delete_animal(&ctx, &id).await {
        Ok(affected_owners) => {
            state.cache.invalidate_matches(&affected_owners).await;
            HttpResponse::Ok().json(DeletedResponse { success: true, id })
        }
        Err(e) => error_response(&e),
    }
}

/// POST /api/v1/animals/{id}/matches
///
/// Runs discovery for one of the caller's animals and returns the matches
/// created by this run.
async fn discover_matches(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> impl Responder {
    let ctx = match actor_context(&state, &req) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match state.lifecycle.discover_matches(&ctx, &path).await {
        Ok(outcome) => {
            state.cache.invalidate_matches(&outcome.affected_owners).await;

            HttpResponse::Ok().json(DiscoverMatchesResponse {
                created: outcome.created,
                candidates_considered: outcome.candidates_considered,
                duplicates_skipped: outcome.duplicates_skipped,
            })
        }
        Err(e) => error_response(&e),
    }
}
