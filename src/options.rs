use reqwest::Method;

use crate::{CascadeError, Result};

/// Configures per-attempt timeout, retry budget and request shape.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchOptions {
    /// Per-attempt deadline in milliseconds.
    pub timeout_ms: u64,
    /// Additional attempts per endpoint after the first.
    pub retries: usize,
    /// Request method used unless an endpoint overrides it.
    pub method: Method,
    /// Extra request headers; endpoint headers win on equal names.
    pub headers: Vec<(String, String)>,
    /// Request body used unless an endpoint overrides it.
    pub body: Option<String>,
    /// Fixed part of the delay between retries of the same endpoint.
    pub backoff_base_ms: u64,
    /// Upper bound of the uniform random part of the retry delay.
    pub backoff_jitter_ms: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 8_000,
            retries: 1,
            method: Method::GET,
            headers: Vec::new(),
            body: None,
            backoff_base_ms: 500,
            backoff_jitter_ms: 500,
        }
    }
}

impl FetchOptions {
    /// Builds options from defaults overridden by environment variables.
    ///
    /// Reads:
    /// - `CASCADE_FETCH_TIMEOUT_MS`
    /// - `CASCADE_FETCH_RETRIES`
    /// - `CASCADE_FETCH_BACKOFF_BASE_MS`
    /// - `CASCADE_FETCH_BACKOFF_JITTER_MS`
    ///
    /// Unset or empty variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();
        if let Some(value) = read_var(&lookup, "CASCADE_FETCH_TIMEOUT_MS")? {
            opts.timeout_ms = value;
        }
        if let Some(value) = read_var(&lookup, "CASCADE_FETCH_RETRIES")? {
            opts.retries = value;
        }
        if let Some(value) = read_var(&lookup, "CASCADE_FETCH_BACKOFF_BASE_MS")? {
            opts.backoff_base_ms = value;
        }
        if let Some(value) = read_var(&lookup, "CASCADE_FETCH_BACKOFF_JITTER_MS")? {
            opts.backoff_jitter_ms = value;
        }
        Ok(opts)
    }

    /// Total attempts allowed per endpoint.
    pub fn attempts_per_endpoint(&self) -> usize {
        self.retries.saturating_add(1)
    }
}

fn read_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|err| CascadeError::Config(format!("{key}='{trimmed}': {err}")))
}
