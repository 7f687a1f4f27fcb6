mod settings;

pub use settings::{BotSettings, Locale};

use std::path::PathBuf;
use url::Url;

use logbo_domain::shared::DomainError;

pub const ENV_MISSKEY_URL: &str = "MISSKEY_URL";
pub const ENV_MISSKEY_TOKEN: &str = "MISSKEY_TOKEN";
pub const ENV_DB_PATH: &str = "LOGBO_DB_PATH";
pub const ENV_LOG_DIR: &str = "LOGBO_LOG_DIR";
pub const ENV_CONFIG: &str = "LOGBO_CONFIG";

const DEFAULT_DB_PATH: &str = "./data/database.db";

/// Everything the binaries need at startup, assembled once.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub misskey_url: String,
    pub misskey_token: String,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub settings: BotSettings,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let misskey_url = get(ENV_MISSKEY_URL).ok_or_else(|| missing(ENV_MISSKEY_URL))?;
        let misskey_token = get(ENV_MISSKEY_TOKEN).ok_or_else(|| missing(ENV_MISSKEY_TOKEN))?;

        let db_path = get(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        let log_dir = get(ENV_LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_log_dir);

        let settings = match get(ENV_CONFIG) {
            Some(path) => BotSettings::from_file(&PathBuf::from(path))?,
            None => BotSettings::default(),
        };

        let config = Self {
            misskey_url,
            misskey_token,
            db_path,
            log_dir,
            settings,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let url = Url::parse(&self.misskey_url).map_err(|e| {
            DomainError::Validation(format!("{} is not a valid URL: {}", ENV_MISSKEY_URL, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DomainError::Validation(format!(
                "{} must use http or https",
                ENV_MISSKEY_URL
            )));
        }

        self.settings.validate()
    }

    pub fn db_path_str(&self) -> Result<&str, DomainError> {
        self.db_path
            .to_str()
            .ok_or_else(|| DomainError::Validation("Database path is not valid UTF-8".to_string()))
    }
}

fn missing(key: &str) -> DomainError {
    DomainError::Validation(format!("{} is not set", key))
}

fn default_log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("logbo").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./data/logs"))
}
