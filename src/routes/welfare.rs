use actix_web::{web, HttpRequest, HttpResponse, Responder};
use crate::models::NewWelfareReport;
use crate::routes::{actor_context, error_response, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/welfare/reports")
            .route(web::get().to(list_reports))
            .route(web::post().to(submit_report)),
    );
}

async fn list_reports(state: web::Data<AppState>) -> impl Responder {
    match state.welfare.list_reports().await {
        Ok(reports) => HttpResponse::Ok().json(reports),
        Err(e) => error_response(&e),
    }
}

/// POST /api/v1/welfare/reports
///
/// Request body:
/// ```json
/// {
///   "incident_type": "abandonment",
///   "description": "Calf left tied near the highway overpass since morning",
///   "location_lat": 26.91,
///   "location_lng": 75.78
/// }
/// ```
async fn submit_report(
    state: web::Data<AppState>,
    body: web::Json<NewWelfareReport>,
    req: HttpRequest,
) -> impl Responder {
    let ctx = match actor_context(&state, &req) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    match state.welfare.submit_report(&ctx, body.into_inner()).await {
        Ok(report) => HttpResponse::Created().json(report),
        Err(e) => error_response(&e),
    }
}
