//! Configuration for Telegram API credentials and tool defaults
//!
//! Loads configuration from config.yml, with `${VAR}` placeholders and
//! environment fallbacks (a `.env` file is read first).

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default constants (fallback if config.yml not found)
pub const SESSION_NAME: &str = "telegram_session";
pub const DEFAULT_FORWARD_DELAY_MS: u64 = 500;
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "flv", "wmv"];

/// YAML config structures
#[derive(Debug, Deserialize)]
struct YamlConfig {
    telegram: Option<TelegramConfig>,
    forward: Option<ForwardConfig>,
    upload: Option<UploadConfig>,
    tdl: Option<TdlConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TelegramConfig {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    api_id: Option<String>,
    api_hash: Option<String>,
    phone: Option<String>,
    session_name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ForwardConfig {
    delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct UploadConfig {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    default_chat: Option<String>,
    extensions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct TdlConfig {
    path: Option<PathBuf>,
}

/// Deserialize a value that can be either a string or a number
fn deserialize_string_or_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<serde_yaml::Value> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, got {:?}",
            other
        ))),
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub phone: String,
    pub api_id: i32,
    pub api_hash: String,
    pub session_name: String,
    pub forward_delay_ms: u64,
    pub upload_default_chat: Option<String>,
    pub video_extensions: Vec<String>,
    pub tdl_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Load configuration from config.yml or use defaults
    /// Environment variables take precedence over config.yml values
    pub fn new() -> Self {
        Self::load_from_file("config.yml")
            .or_else(|_| Self::load_from_file("../config.yml"))
            .unwrap_or_else(|_| Self::from_env())
    }

    /// Resolve a value: prefer env var if config value looks like ${VAR}
    fn resolve_env_string(value: Option<String>, env_key: &str) -> String {
        if let Some(var_name) = value.as_deref().and_then(placeholder_name) {
            if let Ok(env_val) = std::env::var(var_name) {
                return env_val;
            }
        }
        if let Ok(env_val) = std::env::var(env_key) {
            return env_val;
        }
        value
            .filter(|v| placeholder_name(v).is_none())
            .unwrap_or_default()
    }

    /// Resolve an integer value from string config or env var
    fn resolve_env_i32(value: Option<String>, env_key: &str) -> i32 {
        if let Some(ref v) = value {
            if let Some(var_name) = placeholder_name(v) {
                if let Some(parsed) = std::env::var(var_name)
                    .ok()
                    .and_then(|s| s.parse::<i32>().ok())
                {
                    return parsed;
                }
            }
            // Explicit numbers in the file win over the environment
            if let Ok(parsed) = v.parse::<i32>() {
                return parsed;
            }
        }
        std::env::var(env_key)
            .ok()
            .and_then(|s| s.parse::<i32>().ok())
            .unwrap_or(0)
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_dotenv();

        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let yaml: YamlConfig = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(Self::from_yaml(yaml))
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        let telegram = yaml.telegram.unwrap_or_default();
        let forward = yaml.forward.unwrap_or_default();
        let upload = yaml.upload.unwrap_or_default();
        let tdl = yaml.tdl.unwrap_or_default();

        let tdl_path = std::env::var_os("TDL_PATH")
            .map(PathBuf::from)
            .or(tdl.path);

        Self {
            phone: Self::resolve_env_string(telegram.phone, "TELEGRAM_PHONE"),
            api_id: Self::resolve_env_i32(telegram.api_id, "TELEGRAM_API_ID"),
            api_hash: Self::resolve_env_string(telegram.api_hash, "TELEGRAM_API_HASH"),
            session_name: telegram
                .session_name
                .unwrap_or_else(|| SESSION_NAME.to_string()),
            forward_delay_ms: forward.delay_ms.unwrap_or(DEFAULT_FORWARD_DELAY_MS),
            upload_default_chat: upload.default_chat,
            video_extensions: upload
                .extensions
                .map(|exts| {
                    exts.into_iter()
                        .map(|e| e.trim_start_matches('.').to_lowercase())
                        .collect()
                })
                .unwrap_or_else(default_extensions),
            tdl_path,
        }
    }

    /// Config built only from `.env` and the process environment.
    fn from_env() -> Self {
        Self::load_dotenv();
        Self::from_yaml(YamlConfig {
            telegram: None,
            forward: None,
            upload: None,
            tdl: None,
        })
    }

    /// Create config with empty defaults, ignoring files and environment
    pub fn defaults() -> Self {
        Self {
            phone: String::new(),
            api_id: 0,
            api_hash: String::new(),
            session_name: SESSION_NAME.to_string(),
            forward_delay_ms: DEFAULT_FORWARD_DELAY_MS,
            upload_default_chat: None,
            video_extensions: default_extensions(),
            tdl_path: None,
        }
    }

    /// Fail early when the API credentials are missing.
    pub fn require_credentials(&self) -> Result<()> {
        if self.api_id == 0 || self.api_hash.is_empty() {
            eprintln!(
                r#"
⚠️  ERROR: api_id and api_hash are not configured!

Add them to config.yml (telegram.api_id / telegram.api_hash)
or set TELEGRAM_API_ID and TELEGRAM_API_HASH.
Credentials are issued at https://my.telegram.org/apps
"#
            );
            return Err(Error::Config(
                "api_id and api_hash must be set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn session_file(&self) -> String {
        format!("{}.session", self.session_name)
    }

    pub fn lock_file(&self) -> String {
        format!("{}.lock", self.session_name)
    }

    /// Whether a path has one of the configured video extensions.
    pub fn is_video(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let ext = e.to_lowercase();
                self.video_extensions.iter().any(|v| *v == ext)
            })
            .unwrap_or(false)
    }
}

fn default_extensions() -> Vec<String> {
    VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

/// `${VAR}` -> `VAR`
fn placeholder_name(value: &str) -> Option<&str> {
    value.strip_prefix("${")?.strip_suffix('}')
}
