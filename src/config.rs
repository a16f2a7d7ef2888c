//! Runtime configuration, read once from the process environment.
//!
//! `main` loads an optional `.env` file first, so every key below can also
//! live there during development.

use std::time::Duration;

pub const DEFAULT_TOPIC: &str = "Artificial Super Intelligence";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

const TEXTURE_ROOT: &str =
    "https://cdn.jsdelivr.net/gh/mrdoob/three.js@master/examples/textures/planets";

/// Everything the app needs to know before the first frame.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Credential for the generative-language backend. `None` is allowed:
    /// every analysis then fails and is logged.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    /// Per-request timeout. `None` waits for as long as the backend takes.
    pub request_timeout: Option<Duration>,
    pub default_topic: String,
    /// Try the wgpu backend before falling back to the CPU renderer.
    pub prefer_gpu: bool,
    pub textures: TextureUrls,
}

/// Source URLs for the three planet maps.
#[derive(Debug, Clone)]
pub struct TextureUrls {
    pub day: String,
    pub night: String,
    pub clouds: String,
}

impl Default for TextureUrls {
    fn default() -> Self {
        Self {
            day: format!("{}/earth_atmos_2048.jpg", TEXTURE_ROOT),
            night: format!("{}/earth_lights_2048.png", TEXTURE_ROOT),
            clouds: format!("{}/earth_clouds_1024.png", TEXTURE_ROOT),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: None,
            default_topic: DEFAULT_TOPIC.to_string(),
            prefer_gpu: true,
            textures: TextureUrls::default(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from `std::env`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();
        let texture_defaults = TextureUrls::default();

        let request_timeout = get("VIBECHECK_TIMEOUT_SECS").and_then(|raw| match raw.parse::<u64>() {
            Ok(0) => None,
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(_) => {
                log::warn!("Ignoring VIBECHECK_TIMEOUT_SECS={:?}: not a whole number", raw);
                None
            }
        });

        let prefer_gpu = get("VIBECHECK_GPU")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(defaults.prefer_gpu);

        Self {
            api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
            model: get("VIBECHECK_MODEL").unwrap_or(defaults.model),
            api_base: get("VIBECHECK_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            request_timeout,
            default_topic: get("VIBECHECK_TOPIC").unwrap_or(defaults.default_topic),
            prefer_gpu,
            textures: TextureUrls {
                day: get("VIBECHECK_DAY_MAP").unwrap_or(texture_defaults.day),
                night: get("VIBECHECK_NIGHT_MAP").unwrap_or(texture_defaults.night),
                clouds: get("VIBECHECK_CLOUD_MAP").unwrap_or(texture_defaults.clouds),
            },
        }
    }
}
