//! DTO definitions for the player directory endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::PlayerEntity,
    dto::{
        format_system_time,
        score::ScoreSummary,
        validation::{validate_optional_not_blank, validate_player_name},
    },
};

/// Payload used to register a new player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreatePlayerRequest {
    /// Display name; surrounding whitespace is trimmed.
    #[validate(custom(function = "validate_player_name"))]
    pub name: String,
    /// One of the configured grades. Omit for none.
    #[serde(default)]
    #[validate(custom(function = "validate_optional_not_blank"))]
    pub grade: Option<String>,
    /// One of the configured avatar glyphs. Defaults to the first one.
    #[serde(default)]
    #[validate(custom(function = "validate_optional_not_blank"))]
    pub avatar: Option<String>,
}

/// Player as exposed over the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub id: Uuid,
    pub name: String,
    pub grade: Option<String>,
    pub avatar: String,
    /// RFC 3339 registration timestamp.
    pub joined_at: String,
}

impl From<PlayerEntity> for PlayerSummary {
    fn from(player: PlayerEntity) -> Self {
        Self {
            id: player.id,
            name: player.name,
            grade: player.grade,
            avatar: player.avatar,
            joined_at: format_system_time(player.joined_at),
        }
    }
}

/// Player details together with their finalized history.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerProfile {
    pub player: PlayerSummary,
    /// Highest grand total, absent without history.
    pub best: Option<u32>,
    /// Rounded mean grand total, absent without history.
    pub average: Option<u32>,
    /// Results, newest first.
    pub history: Vec<ScoreSummary>,
}

/// Options a client can offer when registering a player.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerOptions {
    pub avatars: Vec<String>,
    pub grades: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_fail_validation() {
        let request = CreatePlayerRequest {
            name: "   ".into(),
            grade: None,
            avatar: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn optional_fields_may_be_omitted() {
        let request: CreatePlayerRequest = serde_json::from_str(r#"{"name":"Robin"}"#).unwrap();
        assert!(request.validate().is_ok());
        assert!(request.grade.is_none());
    }

    #[test]
    fn blank_grade_is_rejected() {
        let request = CreatePlayerRequest {
            name: "Robin".into(),
            grade: Some(" ".into()),
            avatar: None,
        };
        assert!(request.validate().is_err());
    }
}
