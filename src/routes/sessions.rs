use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::session::{
        ActionOutcome, ActivePlayerRequest, ConfirmRequest, JumpRequest, SessionSnapshot,
        ShotRequest, StartSessionRequest,
    },
    error::AppError,
    services::session_service,
    state::{SharedState, engine::ScoringAction},
};

/// Routes driving live scoring sessions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(start_session))
        .route("/sessions/{id}", get(get_session).delete(abandon_session))
        .route("/sessions/{id}/shots", post(record_shot))
        .route("/sessions/{id}/active", post(switch_active_player))
        .route("/sessions/{id}/jump", post(jump_to_cell))
        .route("/sessions/{id}/confirm", post(confirm_distance))
        .route("/sessions/{id}/reward/ack", post(acknowledge_reward))
}

/// Open a session for the selected players, in the given order.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session started", body = SessionSnapshot),
        (status = 400, description = "No valid players were selected")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let snapshot = session_service::start_session(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Current session state", body = SessionSnapshot),
        (status = 404, description = "Unknown or finished session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(session_service::get_session(&state, id).await?))
}

/// Abandon a session. Results already finalized stay in the ledger.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    responses(
        (status = 204, description = "Session abandoned"),
        (status = 404, description = "Unknown or finished session")
    )
)]
pub async fn abandon_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session_service::abandon_session(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record the ring value hit by the active player.
#[utoipa::path(
    post,
    path = "/sessions/{id}/shots",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    request_body = ShotRequest,
    responses(
        (status = 200, description = "Action processed", body = ActionOutcome),
        (status = 400, description = "Ring value above 10"),
        (status = 404, description = "Unknown or finished session")
    )
)]
pub async fn record_shot(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<ShotRequest>>,
) -> Result<Json<ActionOutcome>, AppError> {
    let action = ScoringAction::RecordShot(payload.value);
    Ok(Json(session_service::apply_action(&state, id, action).await?))
}

/// View and score another player.
#[utoipa::path(
    post,
    path = "/sessions/{id}/active",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    request_body = ActivePlayerRequest,
    responses(
        (status = 200, description = "Action processed", body = ActionOutcome),
        (status = 404, description = "Unknown or finished session")
    )
)]
pub async fn switch_active_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActivePlayerRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let action = ScoringAction::SwitchActivePlayer(payload.index);
    Ok(Json(session_service::apply_action(&state, id, action).await?))
}

/// Move the cursor onto a recorded cell so the next shot overwrites it.
#[utoipa::path(
    post,
    path = "/sessions/{id}/jump",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    request_body = JumpRequest,
    responses(
        (status = 200, description = "Action processed", body = ActionOutcome),
        (status = 404, description = "Unknown or finished session")
    )
)]
pub async fn jump_to_cell(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JumpRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let action = ScoringAction::JumpToCell {
        round: payload.round,
        shot: payload.shot,
    };
    Ok(Json(session_service::apply_action(&state, id, action).await?))
}

/// Accept or decline the pending distance confirmation.
#[utoipa::path(
    post,
    path = "/sessions/{id}/confirm",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    request_body = ConfirmRequest,
    responses(
        (status = 200, description = "Action processed", body = ActionOutcome),
        (status = 404, description = "Unknown or finished session")
    )
)]
pub async fn confirm_distance(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let action = if payload.accept {
        ScoringAction::ConfirmDistance
    } else {
        ScoringAction::RejectConfirmation
    };
    Ok(Json(session_service::apply_action(&state, id, action).await?))
}

/// Dismiss the reward of the player who just finished.
#[utoipa::path(
    post,
    path = "/sessions/{id}/reward/ack",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Action processed", body = ActionOutcome),
        (status = 404, description = "Unknown or finished session")
    )
)]
pub async fn acknowledge_reward(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionOutcome>, AppError> {
    let action = ScoringAction::AcknowledgeReward;
    Ok(Json(session_service::apply_action(&state, id, action).await?))
}
