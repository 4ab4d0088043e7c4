use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use crate::error::BridgeError;

pub const DEFAULT_CONFIG_PATH: &str = "configs/config.toml";
pub const ENV_PREFIX: &str = "GLIFBOT";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub glif: GlifConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default = "default_triggers")]
    pub triggers: Vec<TriggerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlifConfig {
    pub api_token: String,
    #[serde(default = "default_glif_endpoint")]
    pub endpoint: String,
    /// Unset means no client-side limit on the generation call.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_image_dir")]
    pub image_dir: String,
    #[serde(default = "default_storage_image_extension")]
    pub image_extension: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            image_dir: default_storage_image_dir(),
            image_extension: default_storage_image_extension(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
    #[serde(default = "default_retention_check_interval_seconds")]
    pub check_interval_seconds: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            check_interval_seconds: default_retention_check_interval_seconds(),
        }
    }
}

impl RetentionConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.retention_days * 86400)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_download_retry_delay_seconds")]
    pub retry_delay_seconds: u64,
    #[serde(default = "default_download_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Skips TLS certificate verification on image downloads. Some image CDNs
    /// behind the glif API serve broken chains; turn off to enforce checks.
    #[serde(default = "default_download_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_download_max_attempts(),
            retry_delay_seconds: default_download_retry_delay_seconds(),
            timeout_seconds: default_download_timeout_seconds(),
            accept_invalid_certs: default_download_accept_invalid_certs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    pub model_id: String,
    pub phrases: Vec<String>,
}

impl TriggerConfig {
    fn new(model_id: &str, phrases: &[&str]) -> Self {
        Self {
            model_id: model_id.to_string(),
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
        }
    }
}

fn default_glif_endpoint() -> String {
    "https://simple-api.glif.app".to_string()
}

fn default_storage_image_dir() -> String {
    "images".to_string()
}

fn default_storage_image_extension() -> String {
    "png".to_string()
}

fn default_retention_days() -> u64 {
    3
}

fn default_retention_check_interval_seconds() -> u64 {
    7200
}

fn default_download_max_attempts() -> u32 {
    3
}

fn default_download_retry_delay_seconds() -> u64 {
    2
}

fn default_download_timeout_seconds() -> u64 {
    30
}

fn default_download_accept_invalid_certs() -> bool {
    true
}

fn default_triggers() -> Vec<TriggerConfig> {
    vec![
        TriggerConfig::new("cm6zapr9v0000stff1002b4fb", &["哪吒", "魔丸哪吒", "魔童哪吒"]),
        TriggerConfig::new("cm6zewimi0003fp45j09st0hx", &["灵珠", "灵珠哪吒", "正版哪吒"]),
        TriggerConfig::new("cm73qmq3d0000sg3muwfpnj6g", &["成年哪吒"]),
        TriggerConfig::new("cm73nyy8f000ah5gj83vxte5p", &["太乙", "太乙真人"]),
        TriggerConfig::new("cm73q06ll000ek0scgndiq0m5", &["申公豹"]),
        TriggerConfig::new("cm70xa3790000vbuxa0dpjmbm", &["敖丙"]),
        TriggerConfig::new("cm73r5y5u0002ptoo61yajlyt", &["敖光"]),
        TriggerConfig::new("cm70zms7l000113rg6dturhpl", &["敖闰"]),
    ]
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        check_secret("glif.api_token", &self.glif.api_token)?;
        check_secret("telegram.bot_token", &self.telegram.bot_token)?;
        if self.glif.endpoint.trim().is_empty() {
            return Err(BridgeError::InvalidConfig("glif.endpoint is empty".to_string()));
        }
        if self.download.max_attempts == 0 {
            return Err(BridgeError::InvalidConfig(
                "download.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.triggers.is_empty() {
            return Err(BridgeError::InvalidConfig("no triggers configured".to_string()));
        }
        let mut seen = HashSet::new();
        for trigger in &self.triggers {
            if trigger.model_id.trim().is_empty() {
                return Err(BridgeError::InvalidConfig(
                    "trigger with empty model_id".to_string(),
                ));
            }
            for phrase in &trigger.phrases {
                if phrase.is_empty() {
                    return Err(BridgeError::InvalidConfig(format!(
                        "empty trigger phrase for model {}",
                        trigger.model_id
                    )));
                }
                if !seen.insert(phrase.as_str()) {
                    return Err(BridgeError::InvalidConfig(format!(
                        "duplicate trigger phrase: {phrase}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_secret(name: &str, value: &str) -> Result<(), BridgeError> {
    let t = value.trim();
    if t.is_empty() || t.starts_with("REPLACE_ME_") {
        return Err(BridgeError::InvalidConfig(format!("{name} is not configured")));
    }
    Ok(())
}
