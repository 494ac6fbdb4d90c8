//! Agent configuration
//!
//! Every field has a default and can be overridden from the environment.
//! The `serve` command also exposes the common ones as flags.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::engine::{ResolverOptions, DEFAULT_MODEL_ID, DEFAULT_THRESHOLD};
use crate::error::{AgentError, Result};

pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:3000", "https://manan-iota.vercel.app"];

#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub host: String,
    pub port: u16,

    /// Firestore project; the in-memory store is used when unset
    pub firestore_project: Option<String>,
    pub firestore_base_url: String,
    pub firestore_token: Option<String>,
    pub store_timeout_ms: u64,

    pub gemini_base_url: String,
    pub model_id: String,
    /// Environment variable holding the Gemini API key
    pub api_key_var: String,
    pub generation_timeout_ms: u64,

    /// Catalog override; the embedded catalog is used when unset
    pub catalog_path: Option<PathBuf>,
    pub match_threshold: u8,

    pub cors_origins: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            firestore_project: None,
            firestore_base_url: "https://firestore.googleapis.com".to_string(),
            firestore_token: None,
            store_timeout_ms: 5000,
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            api_key_var: "GOOGLE_API_KEY".to_string(),
            generation_timeout_ms: 30000,
            catalog_path: None,
            match_threshold: DEFAULT_THRESHOLD,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AgentConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let match_threshold: u8 = parse_or(&var, "MATCH_THRESHOLD", defaults.match_threshold)?;
        if match_threshold > 100 {
            return Err(AgentError::config(format!(
                "MATCH_THRESHOLD must be between 0 and 100, got {}",
                match_threshold
            )));
        }

        let cors_origins = match var("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.cors_origins,
        };

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_or(&var, "PORT", defaults.port)?,
            firestore_project: var("FIRESTORE_PROJECT_ID"),
            firestore_base_url: var("FIRESTORE_BASE_URL").unwrap_or(defaults.firestore_base_url),
            firestore_token: var("FIRESTORE_ACCESS_TOKEN"),
            store_timeout_ms: parse_or(&var, "STORE_TIMEOUT_MS", defaults.store_timeout_ms)?,
            gemini_base_url: var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            model_id: var("GEMINI_MODEL").unwrap_or(defaults.model_id),
            api_key_var: var("API_KEY_VAR").unwrap_or(defaults.api_key_var),
            generation_timeout_ms: parse_or(
                &var,
                "GENERATION_TIMEOUT_MS",
                defaults.generation_timeout_ms,
            )?,
            catalog_path: var("DOUBT_CATALOG_PATH").map(PathBuf::from),
            match_threshold,
            cors_origins,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            model_id: self.model_id.clone(),
            match_threshold: self.match_threshold,
        }
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            warn!("Invalid {key} value: {e}");
            AgentError::config(format!("Invalid {} value '{}': {}", key, raw, e))
        }),
        None => {
            debug!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
