use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub default_search_radius_km: f64,
    pub radius_search_limit: usize,
    pub listener_buffer_size: usize,
    pub base_fare: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            default_search_radius_km: parse_or_default(
                "DEFAULT_SEARCH_RADIUS_KM",
                defaults.default_search_radius_km,
            )?,
            radius_search_limit: parse_or_default(
                "RADIUS_SEARCH_LIMIT",
                defaults.radius_search_limit,
            )?,
            listener_buffer_size: parse_or_default(
                "LISTENER_BUFFER_SIZE",
                defaults.listener_buffer_size,
            )?,
            base_fare: parse_or_default("BASE_FARE", defaults.base_fare)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8000,
            log_level: "info".to_string(),
            default_search_radius_km: 5.0,
            radius_search_limit: 5,
            listener_buffer_size: 64,
            base_fare: 5.0,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
