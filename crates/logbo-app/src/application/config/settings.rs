use serde::{Deserialize, Serialize};
use std::path::Path;

use logbo_domain::calendar::BonusCalendar;
use logbo_domain::feed::TriggerPhrases;
use logbo_domain::reply::VisibilityPolicy;
use logbo_domain::shared::DomainError;

/// Language of rendered replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Locale {
    #[default]
    #[serde(rename = "ja-JP")]
    JaJp,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::JaJp, Locale::EnUs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::JaJp => "ja-JP",
            Locale::EnUs => "en-US",
        }
    }
}

/// Tunables read from the optional JSON overlay file. Every field may be
/// omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotSettings {
    pub utc_offset_hours: i32,
    pub cutover_hour: u32,
    pub ranking_size: u32,
    pub locale: Locale,
    pub visibility_policy: VisibilityPolicy,
    pub triggers: TriggerPhrases,
    pub dedup_retention_minutes: u64,
    pub import_page_delay_ms: u64,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            utc_offset_hours: 9,
            cutover_hour: 5,
            ranking_size: 10,
            locale: Locale::default(),
            visibility_policy: VisibilityPolicy::default(),
            triggers: TriggerPhrases::default(),
            dedup_retention_minutes: 360,
            import_page_delay_ms: 1000,
        }
    }
}

impl BotSettings {
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        serde_json::from_str(json)
            .map_err(|e| DomainError::Deserialization(format!("Invalid settings file: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self, DomainError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Infrastructure(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.calendar()?;

        if self.ranking_size == 0 {
            return Err(DomainError::Validation(
                "rankingSize must be at least 1".to_string(),
            ));
        }

        if self.dedup_retention_minutes == 0 {
            return Err(DomainError::Validation(
                "dedupRetentionMinutes must be at least 1".to_string(),
            ));
        }

        self.triggers.validate()
    }

    pub fn calendar(&self) -> Result<BonusCalendar, DomainError> {
        BonusCalendar::new(self.utc_offset_hours, self.cutover_hour)
    }
}
