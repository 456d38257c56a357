use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use messagely_api::credentials::HashCost;

/// Server settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub hash_cost: HashCost,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = HashCost::default();

        Ok(Self {
            jwt_secret: var_or("MESSAGELY_JWT_SECRET", "dev-secret-change-me"),
            db_path: PathBuf::from(var_or("MESSAGELY_DB_PATH", "messagely.db")),
            host: var_or("MESSAGELY_HOST", "0.0.0.0"),
            port: parse_var("MESSAGELY_PORT", 3000)?,
            hash_cost: HashCost {
                memory_kib: parse_var("MESSAGELY_HASH_MEMORY_KIB", defaults.memory_kib)?,
                iterations: parse_var("MESSAGELY_HASH_ITERATIONS", defaults.iterations)?,
                parallelism: parse_var("MESSAGELY_HASH_PARALLELISM", defaults.parallelism)?,
            },
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
