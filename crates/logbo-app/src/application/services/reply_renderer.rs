use once_cell::sync::Lazy;
use serde_json::Value;

use crate::application::config::Locale;
use logbo_domain::feed::{FeedEvent, Visibility};
use logbo_domain::reply::{ReplyKind, VisibilityPolicy};
use logbo_domain::social::OutgoingReply;
use logbo_domain::streak::RankingEntry;

static TRANSLATIONS_JA: Lazy<Value> = Lazy::new(|| {
    let json_str = include_str!("i18n/locales/ja-JP.json");
    serde_json::from_str(json_str).expect("Failed to parse ja-JP.json")
});

static TRANSLATIONS_EN: Lazy<Value> = Lazy::new(|| {
    let json_str = include_str!("i18n/locales/en-US.json");
    serde_json::from_str(json_str).expect("Failed to parse en-US.json")
});

fn translations(locale: Locale) -> &'static Value {
    match locale {
        Locale::JaJp => &*TRANSLATIONS_JA,
        Locale::EnUs => &*TRANSLATIONS_EN,
    }
}

/// Get a template by key path (e.g. "reply.firstClaim"), falling back to the
/// key itself when it is missing.
fn t(locale: Locale, key: &str) -> String {
    let mut current = translations(locale);

    for part in key.split('.') {
        match current.get(part) {
            Some(value) => current = value,
            None => return key.to_string(),
        }
    }

    current.as_str().unwrap_or(key).to_string()
}

fn medal(rank: usize) -> String {
    match rank {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("{}.", n),
    }
}

/// Turns reply kinds into localized note text and delivery settings.
#[derive(Debug, Clone)]
pub struct ReplyRenderer {
    locale: Locale,
    policy: VisibilityPolicy,
    ranking_size: u32,
}

impl ReplyRenderer {
    pub fn new(locale: Locale, policy: VisibilityPolicy, ranking_size: u32) -> Self {
        Self {
            locale,
            policy,
            ranking_size,
        }
    }

    pub fn render(&self, kind: &ReplyKind, acct: &str) -> String {
        let text = match kind {
            ReplyKind::FirstClaim => t(self.locale, "reply.firstClaim"),
            ReplyKind::Repeat { consecutive, total } => {
                counters(t(self.locale, "reply.repeat"), *consecutive, *total)
            }
            ReplyKind::AlreadyClaimed { consecutive, total } => {
                counters(t(self.locale, "reply.alreadyClaimed"), *consecutive, *total)
            }
            ReplyKind::Ranking { entries } => return self.render_ranking(entries, acct),
            ReplyKind::NoData => t(self.locale, "reply.noData"),
            ReplyKind::FollowConfirmed => t(self.locale, "reply.followConfirmed"),
            ReplyKind::NotFollowing => t(self.locale, "reply.notFollowing"),
        };

        text.replace("{acct}", acct)
    }

    fn render_ranking(&self, entries: &[RankingEntry], acct: &str) -> String {
        let mut text = t(self.locale, "reply.rankingHeader")
            .replace("{acct}", acct)
            .replace("{limit}", &self.ranking_size.to_string());

        let line = t(self.locale, "reply.rankingLine");
        for (index, entry) in entries.iter().enumerate() {
            text.push('\n');
            // Labels go in last and nothing is substituted after them, so a
            // handle is never read as a placeholder.
            text.push_str(
                &counters(line.clone(), entry.consecutive_days, entry.total_days)
                    .replace("{rank}", &medal(index + 1))
                    .replace("{label}", &entry.display_label),
            );
        }

        text.trim_end().to_string()
    }

    /// Reply to `event` carrying `kind`. Direct notes are answered to their
    /// author only.
    pub fn reply_to(&self, event: &FeedEvent, kind: &ReplyKind) -> OutgoingReply {
        let visibility = self.policy.resolve(event.visibility);
        let visible_user_ids = if visibility == Visibility::Specified {
            vec![event.author.id.clone()]
        } else {
            Vec::new()
        };

        OutgoingReply {
            reply_to: event.id.clone(),
            text: self.render(kind, &event.author.acct()),
            visibility,
            visible_user_ids,
        }
    }

    /// Whether `text` is one of the bot's own credited or already-claimed
    /// replies, in any locale.
    pub fn is_claim_receipt(text: &str) -> bool {
        Locale::ALL.iter().any(|locale| {
            translations(*locale)
                .get("receiptMarkers")
                .and_then(Value::as_array)
                .map(|markers| {
                    markers
                        .iter()
                        .filter_map(Value::as_str)
                        .any(|marker| text.contains(marker))
                })
                .unwrap_or(false)
        })
    }
}

fn counters(template: String, consecutive: u32, total: u32) -> String {
    template
        .replace("{consecutive}", &consecutive.to_string())
        .replace("{total}", &total.to_string())
}
