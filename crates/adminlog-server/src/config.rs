use adminlog_audit::AuditConfig;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret used to read bearer credentials. For security: prefer
    /// setting env var `ADMINLOG_JWT_SECRET`.
    #[serde(default)]
    pub jwt_secret: String,

    /// Scheme marker in front of the credential.
    #[serde(default = "default_bearer_prefix")]
    pub bearer_prefix: String,
}

fn default_bearer_prefix() -> String {
    "Bearer ".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            bearer_prefix: default_bearer_prefix(),
        }
    }
}

/// Load configuration from `explicit`, `ADMINLOG_CONFIG`, or `config.toml`.
///
/// A missing file yields defaults; a malformed one is an error.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let path = config_path(explicit);
    let mut cfg = if path.exists() {
        let raw = fs::read_to_string(&path)?;
        toml::from_str::<AppConfig>(&raw)?
    } else {
        tracing::info!(path = %path.display(), "No config file, using defaults");
        AppConfig::default()
    };

    if let Ok(secret) = env::var("ADMINLOG_JWT_SECRET") {
        cfg.auth.jwt_secret = secret;
    }
    if cfg.auth.jwt_secret.is_empty() {
        tracing::warn!("auth.jwt_secret is empty; audit identities will not resolve");
    }

    Ok(cfg)
}

fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Ok(p) = env::var("ADMINLOG_CONFIG") {
        return PathBuf::from(p);
    }
    PathBuf::from("config.toml")
}
