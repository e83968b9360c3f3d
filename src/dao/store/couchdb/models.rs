use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::CouchDaoError;
use crate::{
    dao::models::{PlayerEntity, ScoreEntity},
    state::scoring::RoundScores,
};

pub const PLAYER_PREFIX: &str = "player::";
pub const SCORE_PREFIX: &str = "score::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Minimal view of a document used to learn its current revision.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchPlayerDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub player: PlayerBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerBody {
    pub name: String,
    pub grade: Option<String>,
    pub avatar: String,
    pub joined_at: SystemTime,
}

impl From<PlayerEntity> for CouchPlayerDocument {
    fn from(player: PlayerEntity) -> Self {
        Self {
            id: player_doc_id(player.id),
            rev: None,
            player: PlayerBody {
                name: player.name,
                grade: player.grade,
                avatar: player.avatar,
                joined_at: player.joined_at,
            },
        }
    }
}

impl TryFrom<CouchPlayerDocument> for PlayerEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchPlayerDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: extract_uuid(&doc.id)?,
            name: doc.player.name,
            grade: doc.player.grade,
            avatar: doc.player.avatar,
            joined_at: doc.player.joined_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchScoreDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub score: ScoreBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBody {
    pub player_id: Uuid,
    pub recorded_at: SystemTime,
    pub grand: u32,
    pub near_total: u32,
    pub far_total: u32,
    pub near_rounds: RoundScores,
    pub far_rounds: RoundScores,
}

impl From<ScoreEntity> for CouchScoreDocument {
    fn from(score: ScoreEntity) -> Self {
        Self {
            id: score_doc_id(score.id),
            rev: None,
            score: ScoreBody {
                player_id: score.player_id,
                recorded_at: score.recorded_at,
                grand: score.grand,
                near_total: score.near_total,
                far_total: score.far_total,
                near_rounds: score.near_rounds,
                far_rounds: score.far_rounds,
            },
        }
    }
}

impl TryFrom<CouchScoreDocument> for ScoreEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchScoreDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: extract_uuid(&doc.id)?,
            player_id: doc.score.player_id,
            recorded_at: doc.score.recorded_at,
            grand: doc.score.grand,
            near_total: doc.score.near_total,
            far_total: doc.score.far_total,
            near_rounds: doc.score.near_rounds,
            far_rounds: doc.score.far_rounds,
        })
    }
}

pub fn player_doc_id(id: Uuid) -> String {
    format!("{}{}", PLAYER_PREFIX, id)
}

pub fn score_doc_id(id: Uuid) -> String {
    format!("{}{}", SCORE_PREFIX, id)
}

pub fn extract_uuid(doc_id: &str) -> Result<Uuid, CouchDaoError> {
    let (_, id) = doc_id
        .split_once("::")
        .ok_or_else(|| CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_string(),
            kind: "missing separator",
        })?;

    Uuid::parse_str(id).map_err(|_| CouchDaoError::InvalidDocId {
        doc_id: doc_id.to_string(),
        kind: "invalid UUID",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_documents_keep_their_identity() {
        let player = PlayerEntity {
            id: Uuid::new_v4(),
            name: "Robin".into(),
            grade: Some("5th Grade".into()),
            avatar: "🎯".into(),
            joined_at: SystemTime::UNIX_EPOCH,
        };

        let doc = CouchPlayerDocument::from(player.clone());
        assert!(doc.id.starts_with(PLAYER_PREFIX));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["name"], "Robin");
        assert!(json.get("_rev").is_none());

        let back = PlayerEntity::try_from(doc).unwrap();
        assert_eq!(back, player);
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(extract_uuid("player-without-separator").is_err());
        assert!(extract_uuid("score::not-a-uuid").is_err());
    }
}
