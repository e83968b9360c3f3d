use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::session::DistanceDto;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Identifiers of the sessions currently running.
    pub sessions: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the active player filled a distance and must confirm it.
pub struct ConfirmationRequestedEvent {
    pub session_id: Uuid,
    pub player_id: Uuid,
    pub player_name: String,
    pub distance: DistanceDto,
    pub label: String,
    /// Points shot at that distance.
    pub total: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once the near distance has been locked for a player.
pub struct DistanceLockedEvent {
    pub session_id: Uuid,
    pub player_id: Uuid,
    pub distance: DistanceDto,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after a finalized result reached the ledger.
pub struct ScoreSavedEvent {
    pub session_id: Uuid,
    pub score_id: Uuid,
    pub player_id: Uuid,
    pub player_name: String,
    pub grand: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the ledger refused a finalized result. The session keeps going.
pub struct ScoreSaveFailedEvent {
    pub session_id: Uuid,
    pub player_id: Uuid,
    pub player_name: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once every player of a session has finished.
pub struct SessionCompletedEvent {
    pub session_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a session is dropped before completion.
pub struct SessionAbandonedEvent {
    pub session_id: Uuid,
}
