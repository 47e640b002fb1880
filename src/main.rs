use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use herd_match::config::{Settings, StoreBackend};
use herd_match::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use herd_match::services::{CacheManager, DataStore, MemoryStore, PgStore, PostgrestClient, SessionVerifier};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

async fn build_store(settings: &Settings) -> io::Result<Arc<dyn DataStore>> {
    match settings.store.backend {
        StoreBackend::Postgrest => {
            let supabase = settings
                .supabase
                .as_ref()
                .ok_or_else(|| startup_error("Configuration error", "missing [supabase] section"))?;

            let client = PostgrestClient::new(
                supabase.url.clone(),
                supabase.api_key.clone(),
                supabase.timeout_secs.unwrap_or(30),
            )
            .map_err(|e| startup_error("Failed to build PostgREST client", e))?;

            info!("PostgREST store initialized ({})", supabase.url);
            Ok(Arc::new(client))
        }
        StoreBackend::Postgres => {
            let db = settings
                .database
                .as_ref()
                .ok_or_else(|| startup_error("Configuration error", "missing [database] section"))?;

            let store = PgStore::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

            info!(
                "PostgreSQL store initialized (max: {} connections)",
                db.max_connections.unwrap_or(10)
            );
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // CONFIG_PATH points at a single file instead of config/default + config/local
    let settings = match std::env::var("CONFIG_PATH") {
        Ok(path) => Settings::load_from(path),
        Err(_) => Settings::load(),
    };

    // LOG_LEVEL / LOG_FORMAT win over the [logging] section
    let (file_level, file_format) = match &settings {
        Ok(s) => (s.logging.level.clone(), s.logging.format.clone()),
        Err(_) => ("info".to_string(), "compact".to_string()),
    };
    let log_level = std::env::var("LOG_LEVEL").unwrap_or(file_level);
    let log_format = std::env::var("LOG_FORMAT").unwrap_or(file_format);
    init_tracing(&log_level, &log_format);

    info!("Starting Herd Match service...");

    let settings = settings.map_err(|e| startup_error("Failed to load configuration", e))?;

    info!("Configuration loaded successfully");

    let store = build_store(&settings).await?;

    let cache_ttl = settings.cache.ttl_secs.unwrap_or(30);
    let cache_size = settings.cache.max_entries.unwrap_or(10_000);
    let cache = Arc::new(CacheManager::new(cache_size, cache_ttl));

    info!("Cache manager initialized ({} entries, TTL: {}s)", cache_size, cache_ttl);

    let sessions = Arc::new(SessionVerifier::new(
        &settings.auth.jwt_secret,
        settings.auth.audience.as_deref(),
    ));

    let weights = settings.scoring_weights();
    let policy = settings.match_policy();

    info!("Match lifecycle initialized with weights: {:?}, policy: {:?}", weights, policy);

    let app_state = AppState::new(store, weights, policy, cache, sessions);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
