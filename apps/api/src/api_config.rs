use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use wereport_core::AppError;

/// Backing store for issues, tags and principals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStoreConfig {
    Postgres,
    Memory,
}

impl DataStoreConfig {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::Validation(format!(
                "DATA_STORE must be either 'postgres' or 'memory', got '{other}'"
            ))),
        }
    }
}

/// Backing store for rate limit windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStoreConfig {
    Memory,
    Redis,
}

impl RateLimitStoreConfig {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(AppError::Validation(format!(
                "RATE_LIMIT_STORE must be either 'memory' or 'redis', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub data_store: DataStoreConfig,
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub rate_limit_store: RateLimitStoreConfig,
    pub redis_url: Option<String>,
    pub rate_limit_sweep_interval: Duration,
    pub trust_proxy_headers: bool,
    pub dev_access_tokens: Option<String>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let data_store = DataStoreConfig::parse(
            env::var("DATA_STORE")
                .unwrap_or_else(|_| "postgres".to_owned())
                .as_str(),
        )?;
        let database_url = match data_store {
            DataStoreConfig::Postgres => Some(required_non_empty_env("DATABASE_URL")?),
            DataStoreConfig::Memory => optional_env("DATABASE_URL"),
        };
        if migrate_only && database_url.is_none() {
            return Err(AppError::Validation(
                "DATABASE_URL is required to run migrations".to_owned(),
            ));
        }

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let rate_limit_store = RateLimitStoreConfig::parse(
            env::var("RATE_LIMIT_STORE")
                .unwrap_or_else(|_| "memory".to_owned())
                .as_str(),
        )?;
        let redis_url = optional_env("REDIS_URL");
        if rate_limit_store == RateLimitStoreConfig::Redis && redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when RATE_LIMIT_STORE=redis".to_owned(),
            ));
        }

        let rate_limit_sweep_interval = parse_sweep_interval(
            env::var("RATE_LIMIT_SWEEP_INTERVAL_SECONDS")
                .ok()
                .as_deref(),
        )?;
        let trust_proxy_headers = parse_flag(
            "TRUST_PROXY_HEADERS",
            env::var("TRUST_PROXY_HEADERS").ok().as_deref(),
            true,
        )?;

        let dev_access_tokens = optional_env("DEV_ACCESS_TOKENS");
        if dev_access_tokens.is_some() && data_store != DataStoreConfig::Memory {
            return Err(AppError::Validation(
                "DEV_ACCESS_TOKENS is only supported with DATA_STORE=memory".to_owned(),
            ));
        }

        Ok(Self {
            migrate_only,
            data_store,
            database_url,
            frontend_url,
            api_host,
            api_port,
            rate_limit_store,
            redis_url,
            rate_limit_sweep_interval,
            trust_proxy_headers,
            dev_access_tokens,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_sweep_interval(value: Option<&str>) -> Result<Duration, AppError> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(Duration::from_secs(300));
    };

    let seconds = value.parse::<u64>().map_err(|error| {
        AppError::Validation(format!("invalid RATE_LIMIT_SWEEP_INTERVAL_SECONDS: {error}"))
    })?;
    if seconds == 0 {
        return Err(AppError::Validation(
            "RATE_LIMIT_SWEEP_INTERVAL_SECONDS must be greater than zero".to_owned(),
        ));
    }

    Ok(Duration::from_secs(seconds))
}

fn parse_flag(name: &str, value: Option<&str>, default: bool) -> Result<bool, AppError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(default),
        Some(value) if value.eq_ignore_ascii_case("true") || value == "1" => Ok(true),
        Some(value) if value.eq_ignore_ascii_case("false") || value == "0" => Ok(false),
        Some(other) => Err(AppError::Validation(format!(
            "{name} must be 'true' or 'false', got '{other}'"
        ))),
    }
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
