//! Environment-driven settings shared by the server, the terminal client and
//! the seed script. `.env` is honoured through `dotenvy`.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://tasks.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const DEFAULT_SEED_COUNT: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("preparing database file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub api_url: String,
    pub page_size: NonZeroU32,
    pub seed_count: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; missing keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: parse_or(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?,
            api_url: lookup("API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            page_size: parse_or(&lookup, "PAGE_SIZE", NonZeroU32::new(DEFAULT_PAGE_SIZE))?,
            seed_count: parse_or(&lookup, "SEED_COUNT", Some(DEFAULT_SEED_COUNT))?,
        })
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: Option<T>) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => default.ok_or(ConfigError::Invalid { key, value: String::new() }),
    }
}

/// Ensure SQLite file can be created/opened when using a file-backed URL.
pub fn prepare_sqlite_file(database_url: &str) -> Result<(), ConfigError> {
    use std::{fs, fs::OpenOptions, path::Path};

    // Skip in-memory
    if database_url.starts_with("sqlite::memory:") { return Ok(()); }
    let Some(path) = database_url.strip_prefix("sqlite://") else { return Ok(()) };
    let path = path.split('?').next().unwrap_or(path);
    // On Windows, absolute paths may look like /C:/path; strip the leading slash
    let path = match path.strip_prefix('/') {
        Some(rest) if cfg!(windows) && rest.get(1..2) == Some(":") => rest,
        _ => path,
    };
    let p = Path::new(path);
    if let Some(parent) = p.parent() { if !parent.as_os_str().is_empty() { fs::create_dir_all(parent)?; } }
    if !p.exists() {
        OpenOptions::new().create(true).append(true).open(p)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.page_size.get(), 5);
        assert_eq!(cfg.seed_count, 100);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = Config::from_lookup(lookup(&[
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("API_URL", "http://tasks.local/"),
            ("PAGE_SIZE", " 20 "),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.api_url, "http://tasks.local");
        assert_eq!(cfg.page_size.get(), 20);
    }

    #[test]
    fn invalid_values_name_the_key() {
        let err = Config::from_lookup(lookup(&[("PAGE_SIZE", "many")])).unwrap_err();
        assert_eq!(err.to_string(), "PAGE_SIZE has invalid value 'many'");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = Config::from_lookup(lookup(&[("PAGE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PAGE_SIZE", .. }));
    }

    #[test]
    fn memory_urls_need_no_file() {
        prepare_sqlite_file("sqlite::memory:").unwrap();
    }
}
