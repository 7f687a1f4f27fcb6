use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::event_gate::{DropReason, EventGate, GateDecision};
use super::reply_renderer::ReplyRenderer;
use super::streak_ledger::StreakLedger;
use logbo_domain::feed::{FeedEvent, Trigger};
use logbo_domain::reply::{ReplyComposer, ReplyKind};
use logbo_domain::shared::DomainError;
use logbo_domain::social::SocialGateway;

/// Source of the processing time used for claims.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// What happened to one delivered event.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EventReport {
    pub dropped: Option<DropReason>,
    /// Replies decided by the workflows that ran, in run order.
    pub replies: Vec<ReplyKind>,
    /// Workflows that ended with an error.
    pub failures: usize,
}

fn kind_name(kind: &ReplyKind) -> &'static str {
    match kind {
        ReplyKind::FirstClaim => "first_claim",
        ReplyKind::Repeat { .. } => "repeat",
        ReplyKind::AlreadyClaimed { .. } => "already_claimed",
        ReplyKind::Ranking { .. } => "ranking",
        ReplyKind::NoData => "no_data",
        ReplyKind::FollowConfirmed => "follow_confirmed",
        ReplyKind::NotFollowing => "not_following",
    }
}

/// Runs the follow, ranking and claim workflows for admitted events.
pub struct EventProcessor {
    gate: EventGate,
    ledger: Arc<StreakLedger>,
    gateway: Arc<dyn SocialGateway>,
    renderer: ReplyRenderer,
    clock: Arc<dyn Clock>,
    ranking_size: u32,
}

impl EventProcessor {
    pub fn new(
        gate: EventGate,
        ledger: Arc<StreakLedger>,
        gateway: Arc<dyn SocialGateway>,
        renderer: ReplyRenderer,
        clock: Arc<dyn Clock>,
        ranking_size: u32,
    ) -> Self {
        Self {
            gate,
            ledger,
            gateway,
            renderer,
            clock,
            ranking_size,
        }
    }

    /// Handle every event from `events` on its own task until the sender side
    /// closes. A failing event never stops the loop.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<FeedEvent>) {
        while let Some(event) = events.recv().await {
            let processor = self.clone();
            tokio::spawn(async move {
                processor.handle(event).await;
            });
        }
        info!("Event stream closed");
    }

    pub async fn handle(&self, event: FeedEvent) -> EventReport {
        let mut report = EventReport::default();

        let triggers = match self.gate.admit(&event, self.clock.now()) {
            GateDecision::Dropped(reason) => {
                debug!(
                    note_id = %event.id,
                    channel = %event.channel,
                    reason = reason.as_str(),
                    "Event dropped"
                );
                report.dropped = Some(reason);
                return report;
            }
            GateDecision::Admitted(triggers) => triggers,
        };

        for trigger in triggers.iter() {
            let result = match trigger {
                Trigger::Follow => self.follow_workflow(&event).await,
                Trigger::Ranking => self.ranking_workflow(&event).await,
                Trigger::Claim => self.claim_workflow(&event).await,
            };

            match result {
                Ok(kind) => {
                    info!(
                        note_id = %event.id,
                        channel = %event.channel,
                        user_id = %event.author.id,
                        trigger = trigger.as_str(),
                        outcome = kind_name(&kind),
                        "Workflow completed"
                    );
                    report.replies.push(kind);
                }
                Err(e) => {
                    report.failures += 1;
                    log_failure(&event, trigger, &e);
                }
            }
        }

        report
    }

    async fn follow_workflow(&self, event: &FeedEvent) -> Result<ReplyKind, DomainError> {
        if let Err(e) = self.gateway.follow(&event.author.id).await {
            // The confirmation is still sent; the user can ask again.
            warn!(
                user_id = %event.author.id,
                error = %e.format_with_code(),
                "Follow request failed"
            );
        }

        self.reply(event, ReplyComposer::follow_confirmed()).await
    }

    async fn ranking_workflow(&self, event: &FeedEvent) -> Result<ReplyKind, DomainError> {
        let ranking = self.ledger.top_n(self.ranking_size).await?;
        self.reply(event, ReplyComposer::for_ranking(ranking)).await
    }

    async fn claim_workflow(&self, event: &FeedEvent) -> Result<ReplyKind, DomainError> {
        // Checked before the ledger lock is taken; remote latency never holds it.
        if !self.gate.check_eligibility(&event.author.id).await {
            return self.reply(event, ReplyComposer::not_following()).await;
        }

        let outcome = self
            .ledger
            .claim(&event.author.id, &event.author.acct(), self.clock.now())
            .await?;

        let reaction = ReplyComposer::reaction_for(&outcome);
        if let Err(e) = self.gateway.react(&event.id, reaction).await {
            warn!(
                note_id = %event.id,
                reaction = reaction.emoji(),
                error = %e.format_with_code(),
                "Reaction failed"
            );
        }

        self.reply(event, ReplyComposer::for_claim(&outcome)).await
    }

    async fn reply(&self, event: &FeedEvent, kind: ReplyKind) -> Result<ReplyKind, DomainError> {
        let reply = self.renderer.reply_to(event, &kind);
        self.gateway.post_reply(&reply).await?;
        Ok(kind)
    }
}

fn log_failure(event: &FeedEvent, trigger: Trigger, e: &DomainError) {
    match e {
        DomainError::ExternalService(_) => warn!(
            note_id = %event.id,
            user_id = %event.author.id,
            trigger = trigger.as_str(),
            error = %e.format_with_code(),
            "Workflow failed"
        ),
        _ => error!(
            note_id = %event.id,
            user_id = %event.author.id,
            trigger = trigger.as_str(),
            error = %e.format_with_code(),
            "Workflow failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::Locale;
    use crate::application::services::test_support::{
        bot, event, FixedClock, InMemoryStreakRepository, MockGateway,
    };
    use chrono::TimeZone;
    use logbo_domain::calendar::BonusCalendar;
    use logbo_domain::feed::{FeedChannel, TriggerPhrases, Visibility};
    use logbo_domain::reply::VisibilityPolicy;
    use logbo_domain::shared::{NoteId, UserId};
    use logbo_domain::social::{OutgoingReply, Reaction};
    use std::sync::Mutex;

    struct Harness {
        processor: Arc<EventProcessor>,
        repo: Arc<InMemoryStreakRepository>,
        clock: Arc<FixedClock>,
        posted: Arc<Mutex<Vec<OutgoingReply>>>,
    }

    fn noon_jst(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, 3, 0, 0).unwrap()
    }

    /// Gateway that records posted replies; callers add the rest.
    fn recording_gateway(posted: Arc<Mutex<Vec<OutgoingReply>>>) -> MockGateway {
        let mut gateway = MockGateway::new();
        gateway.expect_post_reply().returning(move |reply| {
            posted.lock().unwrap().push(reply.clone());
            Ok(NoteId::from_string("reply"))
        });
        gateway
    }

    fn harness(build: impl FnOnce(&mut MockGateway)) -> Harness {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let mut gateway = recording_gateway(posted.clone());
        build(&mut gateway);
        harness_with(gateway, posted)
    }

    fn harness_with(gateway: MockGateway, posted: Arc<Mutex<Vec<OutgoingReply>>>) -> Harness {
        let gateway: Arc<dyn SocialGateway> = Arc::new(gateway);
        let repo = Arc::new(InMemoryStreakRepository::new());
        let clock = Arc::new(FixedClock::at(noon_jst(1)));
        let ledger = Arc::new(StreakLedger::new(repo.clone(), BonusCalendar::jst()));
        let gate = EventGate::new(bot(), TriggerPhrases::default(), gateway.clone(), 360);
        let renderer = ReplyRenderer::new(Locale::JaJp, VisibilityPolicy::MirrorSpecified, 10);

        Harness {
            processor: Arc::new(EventProcessor::new(
                gate,
                ledger,
                gateway,
                renderer,
                clock.clone(),
                10,
            )),
            repo,
            clock,
            posted,
        }
    }

    #[tokio::test]
    async fn test_claim_reacts_and_replies() {
        let h = harness(|gateway| {
            gateway.expect_is_followed_by().returning(|_| Ok(true));
            gateway
                .expect_react()
                .withf(|note, reaction| note.as_str() == "n1" && *reaction == Reaction::Accepted)
                .times(1)
                .returning(|_, _| Ok(()));
            gateway
                .expect_react()
                .withf(|note, reaction| note.as_str() == "n2" && *reaction == Reaction::Rejected)
                .times(1)
                .returning(|_, _| Ok(()));
        });

        let report = h
            .processor
            .handle(event("n1", FeedChannel::Mention, "u1", "@logbo ログボ"))
            .await;
        assert_eq!(report.replies, vec![ReplyKind::FirstClaim]);

        let report = h
            .processor
            .handle(event("n2", FeedChannel::Timeline, "u1", "ログボ"))
            .await;
        assert_eq!(
            report.replies,
            vec![ReplyKind::AlreadyClaimed { consecutive: 1, total: 1 }]
        );

        let posted = h.posted.lock().unwrap();
        assert_eq!(posted.len(), 2);
        assert_eq!(posted[0].reply_to.as_str(), "n1");
        assert!(posted[0].text.starts_with("@u1 "));
    }

    #[tokio::test]
    async fn test_streak_follows_processing_clock() {
        let h = harness(|gateway| {
            gateway.expect_is_followed_by().returning(|_| Ok(true));
            gateway.expect_react().returning(|_, _| Ok(()));
        });

        h.processor
            .handle(event("n1", FeedChannel::Mention, "u1", "ログボ"))
            .await;
        h.clock.set(noon_jst(2));
        let mut next_day = event("n2", FeedChannel::Mention, "u1", "ログボ");
        next_day.created_at = noon_jst(2);
        let report = h.processor.handle(next_day).await;

        assert_eq!(
            report.replies,
            vec![ReplyKind::Repeat { consecutive: 2, total: 2 }]
        );
    }

    #[tokio::test]
    async fn test_redelivery_on_next_day_is_not_credited() {
        let h = harness(|gateway| {
            gateway.expect_is_followed_by().times(1).returning(|_| Ok(true));
            gateway.expect_react().times(1).returning(|_, _| Ok(()));
        });
        let note = event("n1", FeedChannel::Mention, "u1", "ログボ");

        let first = h.processor.handle(note.clone()).await;
        h.clock.set(noon_jst(2));
        let replay = h.processor.handle(note).await;

        assert_eq!(first.replies, vec![ReplyKind::FirstClaim]);
        assert_eq!(replay.dropped, Some(DropReason::Stale));
        assert!(replay.replies.is_empty());
        assert_eq!(h.repo.save_count(), 1);
        let record = h.repo.get(&UserId::from_string("u1")).await.unwrap();
        assert_eq!((record.total_days(), record.consecutive_days()), (1, 1));
        assert_eq!(h.posted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cross_channel_duplicate_claims_once() {
        let h = harness(|gateway| {
            gateway.expect_is_followed_by().times(1).returning(|_| Ok(true));
            gateway.expect_react().times(1).returning(|_, _| Ok(()));
        });

        let mention = event("n1", FeedChannel::Mention, "u1", "@logbo ログボ");
        let mut timeline = mention.clone();
        timeline.channel = FeedChannel::Timeline;
        timeline.mentions = vec![UserId::from_string("bot-1")];

        let first = h.processor.handle(mention.clone()).await;
        let second = h.processor.handle(timeline).await;
        let replay = h.processor.handle(mention).await;

        assert_eq!(first.replies, vec![ReplyKind::FirstClaim]);
        assert_eq!(second.dropped, Some(DropReason::OwnedByMentionChannel));
        assert_eq!(replay.dropped, Some(DropReason::Duplicate));
        assert_eq!(h.posted.lock().unwrap().len(), 1);
        assert_eq!(h.repo.save_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_simultaneous_deliveries_credit_once() {
        let h = harness(|gateway| {
            gateway.expect_is_followed_by().returning(|_| Ok(true));
            gateway.expect_react().times(1).returning(|_, _| Ok(()));
        });

        let mention = event("n1", FeedChannel::Mention, "u1", "ログボ");
        let mut timeline = mention.clone();
        timeline.channel = FeedChannel::Timeline;

        let a = tokio::spawn({
            let processor = h.processor.clone();
            async move { processor.handle(mention).await }
        });
        let b = tokio::spawn({
            let processor = h.processor.clone();
            async move { processor.handle(timeline).await }
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert_eq!(a.replies.len() + b.replies.len(), 1);
        let record = h.repo.get(&UserId::from_string("u1")).await.unwrap();
        assert_eq!(record.total_days(), 1);
    }

    #[tokio::test]
    async fn test_not_following_short_circuits() {
        let h = harness(|gateway| {
            gateway.expect_is_followed_by().returning(|_| Ok(false));
            gateway.expect_react().never();
        });

        let report = h
            .processor
            .handle(event("n1", FeedChannel::Mention, "u1", "ログボ"))
            .await;

        assert_eq!(report.replies, vec![ReplyKind::NotFollowing]);
        assert_eq!(h.repo.save_count(), 0);
    }

    #[tokio::test]
    async fn test_relationship_failure_fails_closed() {
        let h = harness(|gateway| {
            gateway
                .expect_is_followed_by()
                .returning(|_| Err(DomainError::ExternalService("503".to_string())));
            gateway.expect_react().never();
        });

        let report = h
            .processor
            .handle(event("n1", FeedChannel::Mention, "u1", "ログボ"))
            .await;

        assert_eq!(report.replies, vec![ReplyKind::NotFollowing]);
        assert_eq!(report.failures, 0);
        assert!(h.repo.get(&UserId::from_string("u1")).await.is_none());
    }

    #[tokio::test]
    async fn test_multiple_triggers_run_in_order() {
        let h = harness(|gateway| {
            gateway
                .expect_follow()
                .withf(|user| user.as_str() == "u1")
                .times(1)
                .returning(|_| Ok(()));
            gateway.expect_is_followed_by().returning(|_| Ok(true));
            gateway.expect_react().returning(|_, _| Ok(()));
        });

        let report = h
            .processor
            .handle(event("n1", FeedChannel::Mention, "u1", "follow me ランキング ログボ"))
            .await;

        assert_eq!(
            report.replies,
            vec![
                ReplyKind::FollowConfirmed,
                ReplyKind::NoData,
                ReplyKind::FirstClaim
            ]
        );
        assert_eq!(h.posted.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_follow_failure_still_confirms() {
        let h = harness(|gateway| {
            gateway
                .expect_follow()
                .returning(|_| Err(DomainError::ExternalService("blocked".to_string())));
        });

        let report = h
            .processor
            .handle(event("n1", FeedChannel::Mention, "u1", "フォローして"))
            .await;

        assert_eq!(report.replies, vec![ReplyKind::FollowConfirmed]);
        assert_eq!(report.failures, 0);
    }

    #[tokio::test]
    async fn test_failed_reply_does_not_block_later_workflows() {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let mut gateway = MockGateway::new();
        gateway.expect_is_followed_by().returning(|_| Ok(true));
        gateway.expect_react().returning(|_, _| Ok(()));
        // Ranking replies bounce; everything else goes through.
        gateway
            .expect_post_reply()
            .withf(|reply| reply.text.contains("データ"))
            .returning(|_| Err(DomainError::ExternalService("rate limited".to_string())));
        let sink = posted.clone();
        gateway
            .expect_post_reply()
            .withf(|reply| !reply.text.contains("データ"))
            .returning(move |reply| {
                sink.lock().unwrap().push(reply.clone());
                Ok(NoteId::from_string("reply"))
            });
        let h = harness_with(gateway, posted);

        let report = h
            .processor
            .handle(event("n1", FeedChannel::Mention, "u1", "ランキング ログボ"))
            .await;

        assert_eq!(report.failures, 1);
        assert_eq!(report.replies, vec![ReplyKind::FirstClaim]);
        assert_eq!(h.posted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_direct_notes_get_direct_replies() {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let h = harness_with(recording_gateway(posted.clone()), posted);

        let mut direct = event("n1", FeedChannel::Mention, "u1", "ランキング");
        direct.visibility = Visibility::Specified;
        h.processor.handle(direct).await;

        let posted = h.posted.lock().unwrap();
        assert_eq!(posted[0].visibility, Visibility::Specified);
        assert_eq!(posted[0].visible_user_ids, vec![UserId::from_string("u1")]);
    }

    #[tokio::test]
    async fn test_run_drains_channel() {
        let h = harness(|gateway| {
            gateway.expect_is_followed_by().returning(|_| Ok(true));
            gateway.expect_react().returning(|_, _| Ok(()));
        });

        let (tx, rx) = mpsc::channel(8);
        tx.send(event("n1", FeedChannel::Mention, "u1", "ログボ"))
            .await
            .unwrap();
        tx.send(event("n2", FeedChannel::Mention, "u2", "ログボ"))
            .await
            .unwrap();
        drop(tx);

        h.processor.clone().run(rx).await;

        // Spawned handlers finish shortly after the loop returns.
        for _ in 0..50 {
            if h.repo.save_count() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(h.repo.save_count(), 2);
    }
}
