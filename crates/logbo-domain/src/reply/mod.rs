use serde::{Deserialize, Serialize};

use crate::feed::Visibility;
use crate::social::Reaction;
use crate::streak::{ClaimOutcome, Ranking, RankingEntry};

/// What a reply says, independent of wording and locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReplyKind {
    FirstClaim,
    Repeat { consecutive: u32, total: u32 },
    AlreadyClaimed { consecutive: u32, total: u32 },
    Ranking { entries: Vec<RankingEntry> },
    NoData,
    FollowConfirmed,
    NotFollowing,
}

/// Maps ledger and workflow results onto reply kinds. No I/O.
pub struct ReplyComposer;

impl ReplyComposer {
    pub fn for_claim(outcome: &ClaimOutcome) -> ReplyKind {
        if outcome.already_claimed_today {
            ReplyKind::AlreadyClaimed {
                consecutive: outcome.consecutive_days,
                total: outcome.total_days,
            }
        } else if outcome.is_first_claim() {
            ReplyKind::FirstClaim
        } else {
            ReplyKind::Repeat {
                consecutive: outcome.consecutive_days,
                total: outcome.total_days,
            }
        }
    }

    pub fn reaction_for(outcome: &ClaimOutcome) -> Reaction {
        if outcome.already_claimed_today {
            Reaction::Rejected
        } else {
            Reaction::Accepted
        }
    }

    pub fn for_ranking(ranking: Ranking) -> ReplyKind {
        match ranking {
            Ranking::NoData => ReplyKind::NoData,
            Ranking::Entries(entries) => ReplyKind::Ranking { entries },
        }
    }

    pub fn follow_confirmed() -> ReplyKind {
        ReplyKind::FollowConfirmed
    }

    pub fn not_following() -> ReplyKind {
        ReplyKind::NotFollowing
    }
}

/// How a reply's visibility follows from the note it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum VisibilityPolicy {
    /// Direct notes are answered directly, everything else publicly.
    #[default]
    MirrorSpecified,
    /// Direct notes are answered directly, everything else on home only.
    AlwaysHome,
}

impl VisibilityPolicy {
    pub fn resolve(&self, source: Visibility) -> Visibility {
        match (self, source) {
            (_, Visibility::Specified) => Visibility::Specified,
            (VisibilityPolicy::MirrorSpecified, _) => Visibility::Public,
            (VisibilityPolicy::AlwaysHome, _) => Visibility::Home,
        }
    }
}
