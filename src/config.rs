//! Configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `CFTRACK_BACKEND_URL` (or `VITE_BACKEND_URL`) | required |
//! | `CFTRACK_PORT` | 3001 |
//! | `CFTRACK_PAGE_SIZE` | 10 |
//! | `CFTRACK_DEBOUNCE_MS` | 300 |
//! | `CFTRACK_REQUEST_TIMEOUT_SECS` | 30 |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

use crate::sync::{DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE};

/// Default port for the local HTTP surface.
pub const DEFAULT_PORT: u16 = 3001;

/// Default timeout for backend requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the tracking backend, without a trailing slash.
    pub backend_url: String,
    pub port: u16,
    pub page_size: u32,
    pub search_debounce: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let backend_url = lookup("CFTRACK_BACKEND_URL")
            .or_else(|| lookup("VITE_BACKEND_URL"))
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .context("CFTRACK_BACKEND_URL is not set")?;

        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            bail!("CFTRACK_BACKEND_URL must be an http(s) URL, got '{backend_url}'");
        }

        let page_size: u32 = parse_or(&lookup, "CFTRACK_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            bail!("CFTRACK_PAGE_SIZE must be at least 1");
        }

        Ok(Self {
            backend_url,
            port: parse_or(&lookup, "CFTRACK_PORT", DEFAULT_PORT)?,
            page_size,
            search_debounce: Duration::from_millis(parse_or(
                &lookup,
                "CFTRACK_DEBOUNCE_MS",
                DEFAULT_SEARCH_DEBOUNCE.as_millis() as u64,
            )?),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "CFTRACK_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT.as_secs(),
            )?),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: '{raw}'")),
        None => Ok(default),
    }
}
