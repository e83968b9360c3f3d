use std::{collections::HashSet, sync::Arc, time::Duration};

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::session::{ActionOutcome, SessionSnapshot, StartSessionRequest},
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        controller::{SessionController, SessionSettings},
        engine::ScoringAction,
        scoring::SessionPlayer,
    },
};

/// Open a scoring session for the selected players.
///
/// Identifiers that do not parse or do not match a registered player are skipped; the
/// session is refused only when nobody is left.
pub async fn start_session(
    state: &SharedState,
    request: StartSessionRequest,
) -> Result<SessionSnapshot, ServiceError> {
    let ids = parse_player_ids(&request.player_ids);

    let mut roster = Vec::with_capacity(ids.len());
    for id in ids {
        match state.players().find_player(id).await? {
            Some(player) => roster.push(SessionPlayer::from(&player)),
            None => debug!(player_id = %id, "skipping unknown player"),
        }
    }

    let session_id = Uuid::new_v4();
    let registry = Arc::downgrade(state);
    let controller = SessionController::start(
        session_id,
        roster,
        Arc::clone(state.ledger()),
        state.sse().clone(),
        SessionSettings::from(state.config()),
    )?
    .with_completion_hook(move |id| {
        if let Some(state) = registry.upgrade() {
            state.sessions().remove(&id);
        }
    });
    let controller = Arc::new(controller);

    let snapshot = controller.snapshot().await;
    state.sessions().insert(session_id, Arc::clone(&controller));
    info!(session_id = %session_id, players = snapshot.players.len(), "session started");

    sse_events::broadcast_session_updated(state.sse(), session_id, &snapshot, controller.labels());
    Ok(SessionSnapshot::new(session_id, &snapshot, controller.labels()))
}

pub async fn get_session(state: &SharedState, id: Uuid) -> Result<SessionSnapshot, ServiceError> {
    let controller = require_session(state, id)?;
    let snapshot = controller.snapshot().await;
    Ok(SessionSnapshot::new(id, &snapshot, controller.labels()))
}

/// Identifiers of every running session.
pub fn session_ids(state: &SharedState) -> Vec<Uuid> {
    state.sessions().iter().map(|entry| *entry.key()).collect()
}

/// Feed one action to a running session.
pub async fn apply_action(
    state: &SharedState,
    id: Uuid,
    action: ScoringAction,
) -> Result<ActionOutcome, ServiceError> {
    let controller = require_session(state, id)?;
    let result = controller.dispatch(action).await;
    let session = SessionSnapshot::new(id, &result.snapshot, controller.labels());
    Ok(ActionOutcome::new(result.transition, session))
}

/// Drop a session; players who had not finished keep no result.
pub fn abandon_session(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let (_, controller) = state
        .sessions()
        .remove(&id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{id}` not found")))?;
    controller.abandon();
    info!(session_id = %id, "session abandoned");
    sse_events::broadcast_session_abandoned(state.sse(), id);
    Ok(())
}

/// Abandon every session left untouched for at least `ttl`, returning their ids.
pub async fn reap_idle_sessions(state: &SharedState, ttl: Duration) -> Vec<Uuid> {
    let mut idle = Vec::new();
    for controller in running_sessions(state) {
        if controller.idle_for().await >= ttl {
            idle.push(controller.id());
        }
    }

    // a session may complete or be deleted between the scan and here
    idle.retain(|id| match abandon_session(state, *id) {
        Ok(()) => true,
        Err(err) => {
            debug!(session_id = %id, error = %err, "idle session already gone");
            false
        }
    });
    if !idle.is_empty() {
        info!(count = idle.len(), "abandoned idle sessions");
    }
    idle
}

/// Abandon the running sessions that include `player_id`, returning their ids.
pub async fn release_player(state: &SharedState, player_id: Uuid) -> Vec<Uuid> {
    let mut holding = Vec::new();
    for controller in running_sessions(state) {
        let snapshot = controller.snapshot().await;
        if snapshot.players.iter().any(|player| player.id == player_id) {
            holding.push(controller.id());
        }
    }

    holding.retain(|id| abandon_session(state, *id).is_ok());
    holding
}

/// Periodically abandon idle sessions until the application state is dropped.
pub fn spawn_idle_reaper(state: &SharedState) -> JoinHandle<()> {
    let registry = Arc::downgrade(state);
    let ttl = state.config().session_idle_ttl();
    let period = state.config().session_sweep_interval();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(state) = registry.upgrade() else {
                warn!("application state dropped; stopping idle session reaper");
                break;
            };
            reap_idle_sessions(&state, ttl).await;
        }
    })
}

fn running_sessions(state: &SharedState) -> Vec<Arc<SessionController>> {
    state
        .sessions()
        .iter()
        .map(|entry| Arc::clone(entry.value()))
        .collect()
}

fn require_session(state: &SharedState, id: Uuid) -> Result<Arc<SessionController>, ServiceError> {
    state
        .session(id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{id}` not found")))
}

/// Read the selected player identifiers.
///
/// Accepts a JSON array of strings or a string containing such an array. Anything
/// malformed yields no identifiers; duplicates keep their first position.
pub(crate) fn parse_player_ids(raw: &Value) -> Vec<Uuid> {
    let decoded;
    let items = match raw {
        Value::Array(items) => items,
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => {
                decoded = items;
                &decoded
            }
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| item.as_str())
        .filter_map(|id| Uuid::parse_str(id.trim()).ok())
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use serde_json::json;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::PlayerEntity,
            store::{PlayerDirectory, memory::MemoryStore},
        },
        state::AppState,
    };

    async fn app_with_players(names: &[&str]) -> (SharedState, Vec<Uuid>) {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for name in names {
            let player = PlayerEntity {
                id: Uuid::new_v4(),
                name: (*name).into(),
                grade: None,
                avatar: "🏹".into(),
                joined_at: SystemTime::now(),
            };
            ids.push(player.id);
            store.add_player(player).await.unwrap();
        }
        let state = AppState::new(
            Arc::new(store.clone()),
            Arc::new(store),
            AppConfig::default(),
        );
        (state, ids)
    }

    #[test]
    fn ids_parse_from_array_or_encoded_string() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(parse_player_ids(&json!([a, b])), vec![a, b]);
        let encoded = serde_json::to_string(&json!([b, a])).unwrap();
        assert_eq!(parse_player_ids(&Value::String(encoded)), vec![b, a]);
    }

    #[test]
    fn malformed_ids_yield_nothing() {
        assert!(parse_player_ids(&json!("not json")).is_empty());
        assert!(parse_player_ids(&json!("{\"a\":1}")).is_empty());
        assert!(parse_player_ids(&json!(42)).is_empty());
        assert!(parse_player_ids(&json!(["nope", 7])).is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first_position() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(parse_player_ids(&json!([a, b, a])), vec![a, b]);
    }

    #[tokio::test]
    async fn unknown_players_are_dropped_from_roster() {
        let (state, ids) = app_with_players(&["Ada", "Bo"]).await;
        let request = StartSessionRequest {
            player_ids: json!([ids[1], Uuid::new_v4(), ids[0]]),
        };

        let snapshot = start_session(&state, request).await.unwrap();
        let names: Vec<_> = snapshot.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Bo", "Ada"]);
        assert_eq!(session_ids(&state), vec![snapshot.id]);
    }

    #[tokio::test]
    async fn empty_roster_is_rejected() {
        let (state, _) = app_with_players(&["Ada"]).await;
        let request = StartSessionRequest {
            player_ids: json!([Uuid::new_v4()]),
        };
        assert!(matches!(
            start_session(&state, request).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(state.sessions().is_empty());
    }

    #[tokio::test]
    async fn actions_report_ignored_transitions() {
        let (state, ids) = app_with_players(&["Ada"]).await;
        let snapshot = start_session(
            &state,
            StartSessionRequest {
                player_ids: json!(ids),
            },
        )
        .await
        .unwrap();

        let outcome = apply_action(&state, snapshot.id, ScoringAction::RecordShot(9))
            .await
            .unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.session.players[0].near_total, 9);

        let outcome = apply_action(&state, snapshot.id, ScoringAction::ConfirmDistance)
            .await
            .unwrap();
        assert!(!outcome.applied);
        assert!(outcome.ignored_reason.is_some());
    }

    #[tokio::test]
    async fn abandoned_sessions_are_gone() {
        let (state, ids) = app_with_players(&["Ada"]).await;
        let snapshot = start_session(
            &state,
            StartSessionRequest {
                player_ids: json!(ids),
            },
        )
        .await
        .unwrap();

        abandon_session(&state, snapshot.id).unwrap();
        assert!(matches!(
            get_session(&state, snapshot.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(abandon_session(&state, snapshot.id).is_err());
    }

    #[tokio::test]
    async fn idle_sessions_are_reaped_and_players_freed() {
        let (state, ids) = app_with_players(&["Ada", "Bo"]).await;
        let idle = start_session(
            &state,
            StartSessionRequest {
                player_ids: json!([ids[0]]),
            },
        )
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let busy = start_session(
            &state,
            StartSessionRequest {
                player_ids: json!([ids[1]]),
            },
        )
        .await
        .unwrap();

        let reaped = reap_idle_sessions(&state, Duration::from_millis(50)).await;
        assert_eq!(reaped, vec![idle.id]);
        assert_eq!(session_ids(&state), vec![busy.id]);

        crate::services::player_service::delete_player(&state, ids[0])
            .await
            .unwrap();
        assert!(state.players().find_player(ids[0]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recent_actions_keep_a_session_alive() {
        let (state, ids) = app_with_players(&["Ada"]).await;
        let snapshot = start_session(
            &state,
            StartSessionRequest {
                player_ids: json!(ids),
            },
        )
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        apply_action(&state, snapshot.id, ScoringAction::RecordShot(8))
            .await
            .unwrap();

        let reaped = reap_idle_sessions(&state, Duration::from_millis(50)).await;
        assert!(reaped.is_empty());
        assert_eq!(session_ids(&state), vec![snapshot.id]);
    }

    #[tokio::test]
    async fn releasing_a_player_drops_only_their_sessions() {
        let (state, ids) = app_with_players(&["Ada", "Bo"]).await;
        let shared = start_session(
            &state,
            StartSessionRequest {
                player_ids: json!(ids),
            },
        )
        .await
        .unwrap();
        let solo = start_session(
            &state,
            StartSessionRequest {
                player_ids: json!([ids[1]]),
            },
        )
        .await
        .unwrap();

        assert_eq!(release_player(&state, ids[0]).await, vec![shared.id]);
        assert_eq!(session_ids(&state), vec![solo.id]);
        assert!(release_player(&state, Uuid::new_v4()).await.is_empty());
    }
}
