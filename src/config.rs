//! Environment-driven configuration.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pool_size: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: load_or("HOST", "127.0.0.1"),
            port: load_or("PORT", "8080"),
            pool_size: load_or("DATABASE_POOL_SIZE", "8"),
        }
    }
}

fn load_or<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            log::info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| log::warn!("invalid {key} value: {e}"))
        .expect("environment misconfigured")
}
