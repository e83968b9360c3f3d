use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::score::{RecentScoreItem, RecentScoresQuery},
    error::AppError,
    services::score_service,
    state::SharedState,
};

/// Routes exposing finalized results.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/scores/recent", get(recent_scores))
        .route("/scores/{id}", delete(delete_score))
}

/// Most recent results across players, newest first.
#[utoipa::path(
    get,
    path = "/scores/recent",
    tag = "scores",
    params(RecentScoresQuery),
    responses((status = 200, description = "Recent results", body = [RecentScoreItem]))
)]
pub async fn recent_scores(
    State(state): State<SharedState>,
    Query(query): Query<RecentScoresQuery>,
) -> Result<Json<Vec<RecentScoreItem>>, AppError> {
    Ok(Json(score_service::recent_scores(&state, query.limit).await?))
}

#[utoipa::path(
    delete,
    path = "/scores/{id}",
    tag = "scores",
    params(("id" = Uuid, Path, description = "Identifier of the result")),
    responses(
        (status = 204, description = "Result deleted"),
        (status = 404, description = "Unknown result")
    )
)]
pub async fn delete_score(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    score_service::delete_score(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
