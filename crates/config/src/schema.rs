/// Config schema types (store, scheduler, platform, generator, media, accounts).
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GramflowConfig {
    pub store: StoreConfig,
    pub scheduler: SchedulerConfig,
    pub platform: PlatformConfig,
    pub generator: GeneratorConfig,
    pub media: MediaConfig,
    pub accounts: Vec<AccountConfig>,
}

impl GramflowConfig {
    /// Look up an account by its configured name.
    pub fn account(&self, name: &str) -> Option<&AccountConfig> {
        self.accounts.iter().find(|a| a.name == name)
    }
}

/// Schedule store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON file holding all scheduled jobs.
    pub jobs_path: PathBuf,
    /// Directory where rendered media and AI-generated images land.
    pub uploads_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            jobs_path: PathBuf::from("scheduled_posts.json"),
            uploads_dir: PathBuf::from("uploads"),
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// IANA timezone all schedule evaluation happens in. Process-wide; jobs
    /// do not carry their own zone.
    pub timezone: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Lisbon".into(),
        }
    }
}

impl SchedulerConfig {
    /// Parse the configured timezone. Invalid zones are a startup error, not
    /// something to fall back from silently.
    pub fn parsed_timezone(&self) -> Result<chrono_tz::Tz, String> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| format!("unknown timezone: {}", self.timezone))
    }
}

/// Platform bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base URL of the platform bridge service.
    pub base_url: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8700".into(),
        }
    }
}

/// Content-generation APIs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub text: TextApiConfig,
    pub image: ImageApiConfig,
}

/// Text-generation (chat completion) API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextApiConfig {
    pub base_url: String,
    pub model: String,
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,
}

impl Default for TextApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            model: "gpt-3.5-turbo".into(),
            api_key: None,
        }
    }
}

/// Image-generation API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageApiConfig {
    pub base_url: String,
    /// Generation engine identifier, part of the request path.
    pub engine: String,
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,
}

impl Default for ImageApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.stability.ai".into(),
            engine: "stable-diffusion-xl-1024-v1-0".into(),
            api_key: None,
        }
    }
}

/// Media tooling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// ffmpeg binary used for video cover derivation.
    pub ffmpeg_binary: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: "ffmpeg".into(),
        }
    }
}

/// A named platform account. Jobs reference accounts by `name`; credentials
/// live only here, never in the schedule store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    pub username: String,
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<Secret<String>>,
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
