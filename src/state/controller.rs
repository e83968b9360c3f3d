//! Runtime owner of a single scoring session.
//!
//! The controller serialises engine calls behind a mutex, then looks at the state the
//! engine left behind to decide which side effects to trigger: SSE notifications, one
//! ledger write per finished player and the delayed completion signal. The engine itself
//! stays free of I/O.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant, SystemTime},
};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::{AppConfig, DistanceLabels},
    dao::{models::NewScore, store::ScoreLedger},
    services::sse_events,
    state::{
        SseHub,
        engine::{ScoringAction, Transition},
        scoring::{Distance, RewardInfo, SessionPlayer, SessionState},
    },
};

/// Knobs a controller needs from the application configuration.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Pause between the session finishing and the completion signal.
    pub completion_delay: Duration,
    pub labels: DistanceLabels,
}

impl From<&AppConfig> for SessionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            completion_delay: config.completion_delay(),
            labels: config.labels().clone(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Reasons a session cannot be opened.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionStartError {
    #[error("no valid players were selected")]
    NoValidPlayers,
}

/// State observed right after an action, with the engine verdict.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub snapshot: SessionState,
    pub transition: Transition,
}

type CompletionHook = Box<dyn Fn(Uuid) + Send + Sync>;

struct Tracked {
    state: SessionState,
    /// Player whose reward already went to the ledger; cleared once the reward is dismissed.
    last_written: Option<Uuid>,
    /// Time of the latest dispatched action, ignored ones included.
    last_activity: Instant,
}

/// Owns one [`SessionState`] and the side effects derived from it.
pub struct SessionController {
    id: Uuid,
    tracked: Mutex<Tracked>,
    ledger: Arc<dyn ScoreLedger>,
    hub: SseHub,
    settings: SessionSettings,
    write_gate: Mutex<()>,
    completed: AtomicBool,
    abandoned: AtomicBool,
    on_complete: Option<CompletionHook>,
}

impl SessionController {
    /// Open a session for `roster`, in the given order.
    pub fn start(
        id: Uuid,
        roster: Vec<SessionPlayer>,
        ledger: Arc<dyn ScoreLedger>,
        hub: SseHub,
        settings: SessionSettings,
    ) -> Result<Self, SessionStartError> {
        if roster.is_empty() {
            return Err(SessionStartError::NoValidPlayers);
        }

        Ok(Self {
            id,
            tracked: Mutex::new(Tracked {
                state: SessionState::new(roster),
                last_written: None,
                last_activity: Instant::now(),
            }),
            ledger,
            hub,
            settings,
            write_gate: Mutex::new(()),
            completed: AtomicBool::new(false),
            abandoned: AtomicBool::new(false),
            on_complete: None,
        })
    }

    /// Run `hook` once the completion signal has been sent.
    pub fn with_completion_hook(mut self, hook: impl Fn(Uuid) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn labels(&self) -> &DistanceLabels {
        &self.settings.labels
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> SessionState {
        self.tracked.lock().await.state.clone()
    }

    /// Time elapsed since the session was opened or last received an action.
    pub async fn idle_for(&self) -> Duration {
        self.tracked.lock().await.last_activity.elapsed()
    }

    /// Stop any pending completion signal; ledger writes already started still finish.
    pub fn abandon(&self) {
        self.abandoned.store(true, Ordering::SeqCst);
    }

    /// Apply `action` and trigger whatever the resulting state calls for.
    pub async fn dispatch(self: &Arc<Self>, action: ScoringAction) -> DispatchResult {
        let locks_near = matches!(action, ScoringAction::ConfirmDistance);

        let mut guard = self.tracked.lock().await;
        let Tracked {
            state,
            last_written,
            last_activity,
        } = &mut *guard;
        *last_activity = Instant::now();

        let pending_before = state.pending_confirmation;
        let transition = state.apply(action);

        if let Transition::Ignored(reason) = transition {
            debug!(session_id = %self.id, %reason, "session action ignored");
            return DispatchResult {
                snapshot: state.clone(),
                transition,
            };
        }

        let labels = &self.settings.labels;
        sse_events::broadcast_session_updated(&self.hub, self.id, state, labels);

        if let Some(distance) = state.pending_confirmation {
            if pending_before != Some(distance) {
                if let Some(player) = state.active_player() {
                    sse_events::broadcast_confirmation_requested(
                        &self.hub, self.id, player, distance, labels,
                    );
                }
            }
        }

        if locks_near && pending_before == Some(Distance::Near) {
            if let Some(player) = state.active_player() {
                info!(session_id = %self.id, player_id = %player.id, "near distance locked");
                sse_events::broadcast_distance_locked(&self.hub, self.id, player.id, labels);
            }
        }

        let to_write = match &state.reward {
            Some(reward) if *last_written != Some(reward.player_id) => {
                *last_written = Some(reward.player_id);
                Some(reward.clone())
            }
            Some(_) => None,
            None => {
                *last_written = None;
                None
            }
        };

        let snapshot = state.clone();
        drop(guard);

        if let Some(reward) = to_write {
            let score = finalized_score(&reward, SystemTime::now());
            let controller = Arc::clone(self);
            tokio::spawn(async move { controller.persist(reward, score).await });
        }

        if snapshot.all_done && !self.completed.swap(true, Ordering::SeqCst) {
            let controller = Arc::clone(self);
            tokio::spawn(async move { controller.complete().await });
        }

        DispatchResult {
            snapshot,
            transition,
        }
    }

    async fn persist(&self, reward: RewardInfo, score: NewScore) {
        let _gate = self.write_gate.lock().await;
        match self.ledger.add_score(score).await {
            Ok(saved) => {
                info!(
                    session_id = %self.id,
                    player_id = %saved.player_id,
                    score_id = %saved.id,
                    grand = saved.grand,
                    "finalized score saved"
                );
                sse_events::broadcast_score_saved(&self.hub, self.id, &reward.name, &saved);
            }
            Err(err) => {
                warn!(
                    session_id = %self.id,
                    player_id = %reward.player_id,
                    error = %err,
                    "failed to save finalized score"
                );
                sse_events::broadcast_score_save_failed(
                    &self.hub,
                    self.id,
                    reward.player_id,
                    &reward.name,
                    err.to_string(),
                );
            }
        }
    }

    async fn complete(&self) {
        tokio::time::sleep(self.settings.completion_delay).await;
        // let writes queued before completion land first
        let _gate = self.write_gate.lock().await;
        if self.abandoned.load(Ordering::SeqCst) {
            return;
        }

        info!(session_id = %self.id, "session completed");
        sse_events::broadcast_session_completed(&self.hub, self.id);
        if let Some(hook) = &self.on_complete {
            hook(self.id);
        }
    }
}

fn finalized_score(reward: &RewardInfo, recorded_at: SystemTime) -> NewScore {
    NewScore {
        player_id: reward.player_id,
        recorded_at,
        grand: reward.grand,
        near_total: reward.near_total,
        far_total: reward.far_total,
        near_rounds: reward.near_rounds,
        far_rounds: reward.far_rounds,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::broadcast;

    use super::*;
    use crate::{
        dao::store::memory::MemoryStore,
        dto::sse::ServerEvent,
        services::sse_events::{
            EVENT_CONFIRMATION_REQUESTED, EVENT_DISTANCE_LOCKED, EVENT_SCORE_SAVE_FAILED,
            EVENT_SCORE_SAVED, EVENT_SESSION_COMPLETED,
        },
        state::{engine::IgnoreReason, scoring::SHOTS},
    };

    const CELLS: usize = crate::state::scoring::ROUNDS * SHOTS;

    fn settings() -> SessionSettings {
        SessionSettings {
            completion_delay: Duration::from_millis(10),
            labels: DistanceLabels::default(),
        }
    }

    fn controller(names: &[&str], store: &MemoryStore, hub: &SseHub) -> Arc<SessionController> {
        let roster = names
            .iter()
            .map(|name| SessionPlayer::new(Uuid::new_v4(), *name, "🏹"))
            .collect();
        let ledger: Arc<dyn ScoreLedger> = Arc::new(store.clone());
        Arc::new(
            SessionController::start(Uuid::new_v4(), roster, ledger, hub.clone(), settings())
                .unwrap(),
        )
    }

    async fn shoot(controller: &Arc<SessionController>, value: u8, count: usize) {
        for _ in 0..count {
            let result = controller.dispatch(ScoringAction::RecordShot(value)).await;
            assert!(result.transition.is_applied());
        }
    }

    async fn finish_active(controller: &Arc<SessionController>, near: u8, far: u8) {
        shoot(controller, near, CELLS).await;
        controller.dispatch(ScoringAction::ConfirmDistance).await;
        shoot(controller, far, CELLS).await;
        controller.dispatch(ScoringAction::ConfirmDistance).await;
    }

    async fn next_named(rx: &mut broadcast::Receiver<ServerEvent>, name: &str) -> ServerEvent {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let event = rx.recv().await.unwrap();
                if event.event.as_deref() == Some(name) {
                    return event;
                }
            }
        })
        .await
        .expect("event was not broadcast in time")
    }

    #[test]
    fn empty_roster_is_rejected() {
        let store = MemoryStore::new();
        let err = SessionController::start(
            Uuid::new_v4(),
            Vec::new(),
            Arc::new(store),
            SseHub::new(4),
            settings(),
        )
        .err();
        assert_eq!(err, Some(SessionStartError::NoValidPlayers));
    }

    #[tokio::test]
    async fn confirmation_and_lock_are_announced() {
        let store = MemoryStore::new();
        let hub = SseHub::new(256);
        let mut rx = hub.subscribe();
        let controller = controller(&["Ada"], &store, &hub);

        shoot(&controller, 6, CELLS).await;
        let event = next_named(&mut rx, EVENT_CONFIRMATION_REQUESTED).await;
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["distance"], "near");
        assert_eq!(payload["total"], 90);

        controller.dispatch(ScoringAction::ConfirmDistance).await;
        let event = next_named(&mut rx, EVENT_DISTANCE_LOCKED).await;
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["message"], "10m locked! Now shoot 15m.");
    }

    #[tokio::test]
    async fn one_ledger_write_per_finished_player() {
        let store = MemoryStore::new();
        let hub = SseHub::new(512);
        let mut rx = hub.subscribe();
        let controller = controller(&["Ada", "Bo"], &store, &hub);

        finish_active(&controller, 10, 0).await;
        next_named(&mut rx, EVENT_SCORE_SAVED).await;

        // further transitions while the reward is still shown must not write again
        controller
            .dispatch(ScoringAction::SwitchActivePlayer(1))
            .await;
        controller
            .dispatch(ScoringAction::SwitchActivePlayer(0))
            .await;

        let result = controller.dispatch(ScoringAction::AcknowledgeReward).await;
        assert_eq!(result.snapshot.active_index, 1);

        finish_active(&controller, 1, 2).await;
        next_named(&mut rx, EVENT_SCORE_SAVED).await;

        let scores = store.recent_scores(10).await.unwrap();
        assert_eq!(scores.len(), 2);
        let mut grands: Vec<_> = scores.iter().map(|s| s.grand).collect();
        grands.sort();
        assert_eq!(grands, vec![45, 150]);
    }

    #[tokio::test]
    async fn failed_write_keeps_session_going() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let hub = SseHub::new(256);
        let mut rx = hub.subscribe();
        let controller = controller(&["Ada"], &store, &hub);

        finish_active(&controller, 3, 3).await;
        let event = next_named(&mut rx, EVENT_SCORE_SAVE_FAILED).await;
        assert!(event.data.contains("Ada"));

        let state = controller.snapshot().await;
        assert!(state.players[0].scoring.done);
        assert_eq!(state.reward.as_ref().map(|r| r.grand), Some(90));
        assert!(store.recent_scores(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn slow_write_does_not_block_shot_entry() {
        let store = MemoryStore::new();
        store.set_write_delay(Duration::from_millis(500));
        let hub = SseHub::new(512);
        let mut rx = hub.subscribe();
        let controller = controller(&["Ada", "Bo"], &store, &hub);

        finish_active(&controller, 4, 4).await;
        controller.dispatch(ScoringAction::AcknowledgeReward).await;

        let result = tokio::time::timeout(
            Duration::from_millis(200),
            controller.dispatch(ScoringAction::RecordShot(7)),
        )
        .await
        .expect("shot entry waited on the ledger write");
        assert!(result.transition.is_applied());
        assert_eq!(result.snapshot.active_index, 1);
        assert_eq!(result.snapshot.players[1].scoring.total(Distance::Near), 7);
        assert!(store.recent_scores(10).await.unwrap().is_empty());

        let event = next_named(&mut rx, EVENT_SCORE_SAVED).await;
        assert!(event.data.contains("Ada"));
        assert_eq!(store.recent_scores(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn any_action_resets_idle_time() {
        let store = MemoryStore::new();
        let hub = SseHub::new(64);
        let controller = controller(&["Ada"], &store, &hub);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(controller.idle_for().await >= Duration::from_millis(30));

        let result = controller.dispatch(ScoringAction::ConfirmDistance).await;
        assert!(!result.transition.is_applied());
        assert!(controller.idle_for().await < Duration::from_millis(30));
    }

    #[tokio::test]
    async fn completion_is_signalled_once() {
        let store = MemoryStore::new();
        let hub = SseHub::new(256);
        let mut rx = hub.subscribe();
        let calls = Arc::new(AtomicUsize::new(0));
        let hook_calls = Arc::clone(&calls);

        let roster = vec![SessionPlayer::new(Uuid::new_v4(), "Ada", "🎯")];
        let controller = Arc::new(
            SessionController::start(
                Uuid::new_v4(),
                roster,
                Arc::new(store.clone()),
                hub.clone(),
                settings(),
            )
            .unwrap()
            .with_completion_hook(move |_| {
                hook_calls.fetch_add(1, Ordering::SeqCst);
            }),
        );

        finish_active(&controller, 5, 5).await;
        let result = controller.dispatch(ScoringAction::AcknowledgeReward).await;
        assert!(result.snapshot.all_done);

        // nothing left to acknowledge, the completion must not fire again
        let again = controller.dispatch(ScoringAction::AcknowledgeReward).await;
        assert_eq!(again.transition, Transition::Ignored(IgnoreReason::NoReward));

        next_named(&mut rx, EVENT_SESSION_COMPLETED).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.recent_scores(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn abandoned_session_does_not_complete() {
        let store = MemoryStore::new();
        let hub = SseHub::new(256);
        let mut rx = hub.subscribe();
        let controller = controller(&["Ada"], &store, &hub);

        finish_active(&controller, 1, 1).await;
        controller.dispatch(ScoringAction::AcknowledgeReward).await;
        controller.abandon();

        let waited = tokio::time::timeout(
            Duration::from_millis(100),
            next_named(&mut rx, EVENT_SESSION_COMPLETED),
        )
        .await;
        assert!(waited.is_err());
    }
}
