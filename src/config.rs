//! Client configuration
//!
//! Defaults are baked at build time from app.config.json; the environment
//! (optionally seeded from `.env.local`) may override the server address and
//! profile location at runtime.

use std::path::PathBuf;
use std::time::Duration;

macro_rules! baked_config {
    ($name:ident, $env:literal) => {
        pub fn $name() -> &'static str {
            option_env!($env).expect(concat!(
                $env,
                " not baked at build time. Check build.rs and app.config.json"
            ))
        }
    };
}

// App display name (e.g., "Whisper")
baked_config!(app_name, "WHISPER_APP_NAME");

// App slug for machine use (e.g., "whisper-console")
baked_config!(app_slug, "WHISPER_APP_SLUG");

// Profile file name under $HOME (e.g., ".whisper")
baked_config!(profile_file_name, "WHISPER_PROFILE_FILE");

// Server API root (e.g., "http://localhost:8080/api/console/v0")
baked_config!(default_api_root, "WHISPER_DEFAULT_API_ROOT");

pub const ENV_API_ROOT: &str = "WHISPER_API_ROOT";
pub const ENV_PROFILE_PATH: &str = "WHISPER_PROFILE_PATH";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_root: String,
    pub profile_path: PathBuf,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok())
    }

    fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_root = non_empty(ENV_API_ROOT).unwrap_or_else(|| default_api_root().to_string());

        let profile_path = match non_empty(ENV_PROFILE_PATH) {
            Some(path) => PathBuf::from(path),
            None => non_empty("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(profile_file_name()),
        };

        Self {
            api_root,
            profile_path,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}
