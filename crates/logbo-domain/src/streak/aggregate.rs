use serde::{Deserialize, Serialize};

use crate::calendar::BonusDay;
use crate::shared::{DomainError, UserId};

/// Result of one claim attempt. Produced fresh per call, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
    pub already_claimed_today: bool,
    pub total_days: u32,
    pub consecutive_days: u32,
}

impl ClaimOutcome {
    pub fn is_first_claim(&self) -> bool {
        !self.already_claimed_today && self.total_days == 1 && self.consecutive_days == 1
    }
}

/// Per-user login bonus ledger entry.
///
/// Invariants: `total_days >= consecutive_days >= 1`, `last_claim_day` never
/// moves backwards, counters only change through [`StreakRecord::claim`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    user_id: UserId,
    display_label: String,
    total_days: u32,
    consecutive_days: u32,
    last_claim_day: BonusDay,
}

impl StreakRecord {
    /// Record for a user's very first claim.
    pub fn first_claim(user_id: UserId, display_label: String, today: BonusDay) -> Self {
        Self {
            user_id,
            display_label,
            total_days: 1,
            consecutive_days: 1,
            last_claim_day: today,
        }
    }

    pub fn restore(
        user_id: UserId,
        display_label: String,
        total_days: u32,
        consecutive_days: u32,
        last_claim_day: BonusDay,
    ) -> Result<Self, DomainError> {
        if consecutive_days == 0 {
            return Err(DomainError::Validation(format!(
                "Streak record for {} has zero consecutive days",
                user_id
            )));
        }

        if total_days < consecutive_days {
            return Err(DomainError::Validation(format!(
                "Streak record for {} has total {} below consecutive {}",
                user_id, total_days, consecutive_days
            )));
        }

        Ok(Self {
            user_id,
            display_label,
            total_days,
            consecutive_days,
            last_claim_day,
        })
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn display_label(&self) -> &str {
        &self.display_label
    }

    pub fn total_days(&self) -> u32 {
        self.total_days
    }

    pub fn consecutive_days(&self) -> u32 {
        self.consecutive_days
    }

    pub fn last_claim_day(&self) -> BonusDay {
        self.last_claim_day
    }

    pub fn outcome(&self, already_claimed_today: bool) -> ClaimOutcome {
        ClaimOutcome {
            already_claimed_today,
            total_days: self.total_days,
            consecutive_days: self.consecutive_days,
        }
    }

    /// Apply a claim for `today`.
    ///
    /// Returns the outcome and whether the record changed and must be saved.
    /// Same day refreshes the label only. A gap of one day extends the run,
    /// a larger gap restarts it at 1. A gap of zero or less (clock skew,
    /// out-of-order delivery) is reported as already claimed and touches nothing.
    pub fn claim(&mut self, display_label: &str, today: BonusDay) -> (ClaimOutcome, bool) {
        if today == self.last_claim_day {
            let relabelled = self.display_label != display_label;
            if relabelled {
                self.display_label = display_label.to_string();
            }
            return (self.outcome(true), relabelled);
        }

        let gap_days = today.days_since(self.last_claim_day);
        if gap_days <= 0 {
            return (self.outcome(true), false);
        }

        self.total_days = self.total_days.saturating_add(1);
        self.consecutive_days = if gap_days == 1 {
            self.consecutive_days.saturating_add(1)
        } else {
            1
        };
        self.last_claim_day = today;
        self.display_label = display_label.to_string();

        (self.outcome(false), true)
    }
}
