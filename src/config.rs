use serde::Deserialize;
use std::env;
use std::path::Path;
use config; // Explicitly import the config crate
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

/// Which backend the server talks to.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// The hosted record store, blob store and auth provider.
    Supabase,
    /// Process-local stores for previews; nothing survives a restart.
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    // These fields will be populated from the .env file
    pub backend_mode: BackendMode,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub storage_bucket: String,
    pub session_secret_key: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub use_secure_cookies: bool,
    pub max_upload_size_mb: u64,
    pub memory_admin_email: String,
    pub memory_admin_password: String,
}

fn required<F>(lookup: &F, key: &str) -> Result<String, config::ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(config::ConfigError::Message(format!(
            "FATAL: Environment variable '{}' is not set in your .env file.",
            key
        ))),
    }
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        // Load the specified .env file. Propagate an error if it fails.
        dotenvy::from_path(env_path)
            .map_err(|e| config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}", env_path.display(), e
            )))?;

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    /// `from_env` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_mode = match lookup("BACKEND_MODE").as_deref().map(str::trim) {
            None | Some("") | Some("supabase") => "supabase",
            Some("memory") => "memory",
            Some(other) => {
                return Err(config::ConfigError::Message(format!(
                    "FATAL: 'BACKEND_MODE' must be 'supabase' or 'memory', got '{}'.",
                    other
                )))
            }
        };

        // The hosted backend cannot be reached without both values.
        let (supabase_url, supabase_anon_key) = if backend_mode == "supabase" {
            let url = required(&lookup, "SUPABASE_URL")?;
            let key = required(&lookup, "SUPABASE_ANON_KEY")?;
            match Url::parse(&url) {
                Ok(parsed) if parsed.scheme() == "https" || parsed.scheme() == "http" => {}
                _ => {
                    return Err(config::ConfigError::Message(format!(
                        "FATAL: 'SUPABASE_URL' must be an absolute http(s) URL, got '{}'.",
                        url
                    )))
                }
            }
            (url.trim_end_matches('/').to_string(), key)
        } else {
            (String::new(), String::new())
        };

        let session_secret_key = required(&lookup, "SESSION_SECRET_KEY")?;

        // The secret key must be 128 hex characters (64 bytes).
        if session_secret_key.len() != 128
            || !session_secret_key.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(config::ConfigError::Message(
                "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes)."
                    .to_string(),
            ));
        }

        let storage_bucket = lookup("STORAGE_BUCKET")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "images".to_string());

        if !storage_bucket.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(config::ConfigError::Message(
                "FATAL: 'STORAGE_BUCKET' can only contain letters, numbers, underscores, and hyphens."
                    .to_string(),
            ));
        }

        let allowed_origins = lookup("ALLOWED_ORIGINS").unwrap_or_default();
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        // Defaults to false if not set or invalid.
        let use_secure_cookies = lookup("USE_SECURE_COOKIES")
            .and_then(|v| v.trim().parse::<bool>().ok())
            .unwrap_or(false);

        let max_upload_size_mb = match lookup("MAX_UPLOAD_SIZE_MB") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                config::ConfigError::Message(format!(
                    "FATAL: 'MAX_UPLOAD_SIZE_MB' must be a whole number, got '{}'.",
                    raw
                ))
            })?,
            None => 10,
        };

        let (memory_admin_email, memory_admin_password) = if backend_mode == "memory" {
            (
                required(&lookup, "MEMORY_ADMIN_EMAIL")?,
                required(&lookup, "MEMORY_ADMIN_PASSWORD")?,
            )
        } else {
            (String::new(), String::new())
        };

        let builder = config::Config::builder()
            .set_default("web.host", "127.0.0.1")?
            .set_default("web.port", 8080_i64)?
            // Load base settings from the TOML file (e.g., for web host/port).
            .add_source(
                config::File::new("config/default.toml", config::FileFormat::Toml).required(false),
            )
            .set_override("backend_mode", backend_mode)?
            .set_override("supabase_url", supabase_url)?
            .set_override("supabase_anon_key", supabase_anon_key)?
            .set_override("storage_bucket", storage_bucket)?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .set_override("max_upload_size_mb", i64::from(max_upload_size_mb))?
            .set_override("memory_admin_email", memory_admin_email)?
            .set_override("memory_admin_password", memory_admin_password)?
            .build()?;

        builder.try_deserialize()
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}
