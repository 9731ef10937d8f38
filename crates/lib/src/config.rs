//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.larkbridge/config.json`) and
//! environment. Credentials and the answer-service URL can be overridden per
//! key via env vars so deployments don't need a config file at all.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Required prefix for Lark application ids (self-built apps).
pub const APP_ID_PREFIX: &str = "cli_";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Lark application credentials.
    #[serde(default)]
    pub app: AppConfig,

    /// Downstream answer-service settings.
    #[serde(default)]
    pub answer: AnswerConfig,

    /// Webhook server bind and port.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Lark application credentials (from the developer console).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// App id; must start with "cli_". Overridden by LARK_APP_ID env when set.
    pub app_id: Option<String>,
    /// App secret. Overridden by LARK_APP_SECRET env when set.
    pub app_secret: Option<String>,
}

/// Downstream question-answering service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerConfig {
    /// Base URL of the answer service. Overridden by ANSWER_SERVICE_URL env when set.
    pub url: Option<String>,
}

/// Webhook server bind and port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for the webhook HTTP server (default 9000). Overridden by LARKBRIDGE_PORT env when set.
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

fn default_server_port() -> u16 {
    9000
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn config_nonempty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the app id: env LARK_APP_ID overrides config.
pub fn resolve_app_id(config: &Config) -> Option<String> {
    env_nonempty("LARK_APP_ID").or_else(|| config_nonempty(&config.app.app_id))
}

/// Resolve the app secret: env LARK_APP_SECRET overrides config.
pub fn resolve_app_secret(config: &Config) -> Option<String> {
    env_nonempty("LARK_APP_SECRET").or_else(|| config_nonempty(&config.app.app_secret))
}

/// Resolve the answer-service URL: env ANSWER_SERVICE_URL overrides config.
pub fn resolve_answer_url(config: &Config) -> Option<String> {
    env_nonempty("ANSWER_SERVICE_URL").or_else(|| config_nonempty(&config.answer.url))
}

/// Validate application credentials. Returns a user-readable message on failure;
/// never touches the platform — this is a shape check only.
pub fn check_credentials(app_id: Option<&str>, app_secret: Option<&str>) -> Result<(), String> {
    let app_id = app_id.map(str::trim).unwrap_or("");
    if app_id.is_empty() {
        return Err("app id is not configured".to_string());
    }
    if !app_id.starts_with(APP_ID_PREFIX) {
        return Err(format!("app id must start with {}", APP_ID_PREFIX));
    }
    let app_secret = app_secret.map(str::trim).unwrap_or("");
    if app_secret.is_empty() {
        return Err("app secret is not configured".to_string());
    }
    Ok(())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("LARKBRIDGE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".larkbridge").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or LARKBRIDGE_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
