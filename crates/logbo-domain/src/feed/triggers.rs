use serde::{Deserialize, Serialize};

use crate::shared::DomainError;

/// Workflow requested by a phrase in the note text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    Follow,
    Ranking,
    Claim,
}

impl Trigger {
    /// Order in which fired workflows run for one event.
    pub const ALL: [Trigger; 3] = [Trigger::Follow, Trigger::Ranking, Trigger::Claim];

    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Follow => "follow",
            Trigger::Ranking => "ranking",
            Trigger::Claim => "claim",
        }
    }
}

/// Triggers fired by one event. Not mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerSet {
    follow: bool,
    ranking: bool,
    claim: bool,
}

impl TriggerSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, trigger: Trigger) -> Self {
        match trigger {
            Trigger::Follow => self.follow = true,
            Trigger::Ranking => self.ranking = true,
            Trigger::Claim => self.claim = true,
        }
        self
    }

    pub fn contains(&self, trigger: Trigger) -> bool {
        match trigger {
            Trigger::Follow => self.follow,
            Trigger::Ranking => self.ranking,
            Trigger::Claim => self.claim,
        }
    }

    pub fn only(&self, trigger: Trigger) -> Self {
        if self.contains(trigger) {
            Self::empty().with(trigger)
        } else {
            Self::empty()
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.follow || self.ranking || self.claim)
    }

    pub fn iter(&self) -> impl Iterator<Item = Trigger> + '_ {
        Trigger::ALL.into_iter().filter(|t| self.contains(*t))
    }
}

/// Phrases that fire each trigger; a plain substring match on the note text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerPhrases {
    pub follow: Vec<String>,
    pub ranking: Vec<String>,
    pub claim: Vec<String>,
}

impl Default for TriggerPhrases {
    fn default() -> Self {
        Self {
            follow: vec!["follow me".to_string(), "フォローして".to_string()],
            ranking: vec!["ランキング".to_string()],
            claim: vec!["ログボ".to_string()],
        }
    }
}

impl TriggerPhrases {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, phrases) in [
            ("follow", &self.follow),
            ("ranking", &self.ranking),
            ("claim", &self.claim),
        ] {
            if phrases.is_empty() {
                return Err(DomainError::Validation(format!(
                    "At least one {} phrase is required",
                    name
                )));
            }
            // An empty phrase would match every note.
            if phrases.iter().any(|p| p.trim().is_empty()) {
                return Err(DomainError::Validation(format!(
                    "Empty {} phrase is not allowed",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn detect(&self, text: &str) -> TriggerSet {
        let hit = |phrases: &[String]| phrases.iter().any(|p| !p.is_empty() && text.contains(p));

        let mut set = TriggerSet::empty();
        if hit(&self.follow) {
            set = set.with(Trigger::Follow);
        }
        if hit(&self.ranking) {
            set = set.with(Trigger::Ranking);
        }
        if hit(&self.claim) {
            set = set.with(Trigger::Claim);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_multiple_triggers() {
        let phrases = TriggerPhrases::default();
        let set = phrases.detect("@logbo follow me ログボ ランキング");

        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Trigger::Follow, Trigger::Ranking, Trigger::Claim]
        );
    }

    #[test]
    fn test_detect_nothing() {
        let phrases = TriggerPhrases::default();
        assert!(phrases.detect("おはよう").is_empty());
        assert!(phrases.detect("").is_empty());
    }

    #[test]
    fn test_only_keeps_single_trigger() {
        let set = TriggerSet::empty()
            .with(Trigger::Follow)
            .with(Trigger::Claim);

        assert_eq!(set.only(Trigger::Claim).iter().collect::<Vec<_>>(), vec![Trigger::Claim]);
        assert!(set.only(Trigger::Ranking).is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_phrase() {
        let phrases = TriggerPhrases {
            claim: vec!["".to_string()],
            ..TriggerPhrases::default()
        };
        assert!(matches!(phrases.validate(), Err(DomainError::Validation(_))));
        assert!(TriggerPhrases::default().validate().is_ok());
    }
}
