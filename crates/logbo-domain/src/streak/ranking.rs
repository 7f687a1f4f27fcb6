use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub display_label: String,
    pub consecutive_days: u32,
    pub total_days: u32,
}

/// Leaderboard result. An empty ledger is reported as `NoData`, never as an
/// empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ranking {
    NoData,
    Entries(Vec<RankingEntry>),
}

impl Ranking {
    pub fn from_entries(entries: Vec<RankingEntry>) -> Self {
        if entries.is_empty() {
            Ranking::NoData
        } else {
            Ranking::Entries(entries)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Ranking::NoData => 0,
            Ranking::Entries(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Ranking::NoData)
    }
}
