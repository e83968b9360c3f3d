use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::DistanceLabels,
    dao::models::ScoreEntity,
    dto::{
        session::SessionSnapshot,
        sse::{
            ConfirmationRequestedEvent, DistanceLockedEvent, ScoreSaveFailedEvent,
            ScoreSavedEvent, ServerEvent, SessionAbandonedEvent, SessionCompletedEvent,
        },
    },
    state::{
        SseHub,
        scoring::{Distance, SessionPlayer, SessionState},
    },
};

pub const EVENT_SESSION_UPDATED: &str = "session.updated";
pub const EVENT_CONFIRMATION_REQUESTED: &str = "confirmation.requested";
pub const EVENT_DISTANCE_LOCKED: &str = "distance.locked";
pub const EVENT_SCORE_SAVED: &str = "score.saved";
pub const EVENT_SCORE_SAVE_FAILED: &str = "score.save_failed";
pub const EVENT_SESSION_COMPLETED: &str = "session.completed";
pub const EVENT_SESSION_ABANDONED: &str = "session.abandoned";

/// Broadcast the full view of a session after a change.
pub fn broadcast_session_updated(
    hub: &SseHub,
    session_id: Uuid,
    state: &SessionState,
    labels: &DistanceLabels,
) {
    let payload = SessionSnapshot::new(session_id, state, labels);
    send_event(hub, EVENT_SESSION_UPDATED, &payload);
}

/// Ask the operator to confirm (or take back) the distance `player` just filled.
pub fn broadcast_confirmation_requested(
    hub: &SseHub,
    session_id: Uuid,
    player: &SessionPlayer,
    distance: Distance,
    labels: &DistanceLabels,
) {
    let payload = ConfirmationRequestedEvent {
        session_id,
        player_id: player.id,
        player_name: player.name.clone(),
        distance: distance.into(),
        label: labels.label(distance).to_string(),
        total: player.scoring.total(distance),
    };
    send_event(hub, EVENT_CONFIRMATION_REQUESTED, &payload);
}

/// Notify that the near distance is locked and shooting moves to the far one.
pub fn broadcast_distance_locked(
    hub: &SseHub,
    session_id: Uuid,
    player_id: Uuid,
    labels: &DistanceLabels,
) {
    let payload = DistanceLockedEvent {
        session_id,
        player_id,
        distance: Distance::Near.into(),
        message: format!(
            "{} locked! Now shoot {}.",
            labels.label(Distance::Near),
            labels.label(Distance::Far)
        ),
    };
    send_event(hub, EVENT_DISTANCE_LOCKED, &payload);
}

pub fn broadcast_score_saved(hub: &SseHub, session_id: Uuid, player_name: &str, score: &ScoreEntity) {
    let payload = ScoreSavedEvent {
        session_id,
        score_id: score.id,
        player_id: score.player_id,
        player_name: player_name.to_string(),
        grand: score.grand,
    };
    send_event(hub, EVENT_SCORE_SAVED, &payload);
}

pub fn broadcast_score_save_failed(
    hub: &SseHub,
    session_id: Uuid,
    player_id: Uuid,
    player_name: &str,
    message: String,
) {
    let payload = ScoreSaveFailedEvent {
        session_id,
        player_id,
        player_name: player_name.to_string(),
        message,
    };
    send_event(hub, EVENT_SCORE_SAVE_FAILED, &payload);
}

/// Signal that every player finished; clients navigate back to the start screen.
pub fn broadcast_session_completed(hub: &SseHub, session_id: Uuid) {
    let payload = SessionCompletedEvent {
        session_id,
        message: "Tournament complete!".into(),
    };
    send_event(hub, EVENT_SESSION_COMPLETED, &payload);
}

pub fn broadcast_session_abandoned(hub: &SseHub, session_id: Uuid) {
    let payload = SessionAbandonedEvent { session_id };
    send_event(hub, EVENT_SESSION_ABANDONED, &payload);
}

fn send_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
