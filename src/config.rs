use crate::models::{MatchPolicy, ScoringWeights};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    #[serde(default)]
    pub supabase: Option<SupabaseSettings>,
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
    pub auth: AuthSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Which data collaborator backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgrest,
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSettings {
    pub url: String,
    pub api_key: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    pub ttl_secs: Option<u64>,
    pub max_entries: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default = "default_dedupe_pairs")]
    pub dedupe_pairs: bool,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            dedupe_pairs: default_dedupe_pairs(),
        }
    }
}

fn default_min_score() -> f64 { 0.7 }
fn default_dedupe_pairs() -> bool { true }

impl From<&MatchingSettings> for MatchPolicy {
    fn from(settings: &MatchingSettings) -> Self {
        MatchPolicy {
            min_score: settings.min_score,
            dedupe_pairs: settings.dedupe_pairs,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_breed_weight")]
    pub breed: f64,
    #[serde(default = "default_age_weight")]
    pub age: f64,
    #[serde(default = "default_health_weight")]
    pub health: f64,
    #[serde(default = "default_milk_weight")]
    pub milk: f64,
    #[serde(default = "default_age_window_years")]
    pub age_window_years: f64,
    #[serde(default = "default_milk_threshold_lpd")]
    pub milk_threshold_lpd: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            breed: default_breed_weight(),
            age: default_age_weight(),
            health: default_health_weight(),
            milk: default_milk_weight(),
            age_window_years: default_age_window_years(),
            milk_threshold_lpd: default_milk_threshold_lpd(),
        }
    }
}

fn default_breed_weight() -> f64 { 0.3 }
fn default_age_weight() -> f64 { 0.2 }
fn default_health_weight() -> f64 { 0.3 }
fn default_milk_weight() -> f64 { 0.2 }
fn default_age_window_years() -> f64 { 5.0 }
fn default_milk_threshold_lpd() -> f64 { 15.0 }

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        ScoringWeights {
            breed: config.breed,
            age: config.age,
            health: config.health,
            milk: config.milk,
            age_window_years: config.age_window_years,
            milk_threshold_lpd: config.milk_threshold_lpd,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml, then config/local.toml)
    /// 3. Environment variables (prefixed with HERD_)
    /// 4. SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY, SUPABASE_JWT_SECRET, DATABASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(
            Config::builder()
                // Add default config file
                .add_source(File::with_name("config/default").required(false))
                // Add local config file (for development overrides)
                .add_source(File::with_name("config/local").required(false)),
        )
    }

    /// Load configuration from a custom path, with the same overrides as [`Settings::load`]
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from(path.as_ref())))
    }

    fn build(files: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings = files
            // Add environment variables (prefixed with HERD_)
            // e.g., HERD__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("HERD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Well-known hosting variables win over file values
        let settings = substitute_env_vars(settings)?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that the selected backend has its connection section and that
    /// no secret is empty or an unresolved `${VAR}` placeholder
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_secret("auth.jwt_secret", &self.auth.jwt_secret)?;

        if let (StoreBackend::Postgrest, Some(supabase)) = (self.store.backend, &self.supabase) {
            require_secret("supabase.api_key", &supabase.api_key)?;
        }

        match self.store.backend {
            StoreBackend::Postgrest if self.supabase.is_none() => Err(ConfigError::Message(
                "store.backend = \"postgrest\" requires a [supabase] section".to_string(),
            )),
            StoreBackend::Postgres if self.database.is_none() => Err(ConfigError::Message(
                "store.backend = \"postgres\" requires a [database] section".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights::from(&self.scoring.weights)
    }

    pub fn match_policy(&self) -> MatchPolicy {
        MatchPolicy::from(&self.matching)
    }
}

fn require_secret(key: &str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    if value.is_empty() || value.contains("${") {
        return Err(ConfigError::Message(format!(
            "{} is not set; provide it through the environment",
            key
        )));
    }
    Ok(())
}

/// Apply the conventional hosting variables
/// (SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY, SUPABASE_JWT_SECRET, DATABASE_URL)
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("SUPABASE_URL", "supabase.url"),
        ("SUPABASE_SERVICE_ROLE_KEY", "supabase.api_key"),
        ("SUPABASE_JWT_SECRET", "auth.jwt_secret"),
        ("DATABASE_URL", "database.url"),
    ];

    let mut builder = Config::builder().add_source(settings);

    for (var, key) in overrides {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
