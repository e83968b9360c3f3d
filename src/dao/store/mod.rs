#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod file;
pub mod memory;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{NewScore, PlayerEntity, ScoreEntity};
use crate::dao::storage::StorageResult;

/// Registered players, read at session start and managed by the player routes.
pub trait PlayerDirectory: Send + Sync {
    fn add_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Players in registration order.
    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    /// Returns `false` when no such player existed.
    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Append-only store of finalized results.
pub trait ScoreLedger: Send + Sync {
    fn add_score(&self, score: NewScore) -> BoxFuture<'static, StorageResult<ScoreEntity>>;
    /// Returns `false` when no such result existed.
    fn delete_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Returns how many results were removed.
    fn delete_scores_for_player(&self, player_id: Uuid)
    -> BoxFuture<'static, StorageResult<usize>>;
    fn scores_for_player(&self, player_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    /// Up to `limit` results, newest first.
    fn recent_scores(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
}
