use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PlayerDirectory, ScoreLedger};
use crate::dao::{
    models::{NewScore, PlayerEntity, ScoreEntity, sort_newest_first},
    storage::{StorageError, StorageResult},
};

/// Volatile store keeping players and scores in insertion order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryTables>>,
    fail_writes: Arc<AtomicBool>,
    write_delay_ms: Arc<AtomicU64>,
}

#[derive(Default)]
struct MemoryTables {
    players: IndexMap<Uuid, PlayerEntity>,
    scores: IndexMap<Uuid, ScoreEntity>,
}

#[derive(Debug, thiserror::Error)]
#[error("memory store rejected the write")]
struct RejectedWrite;

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent ledger write fail, or succeed again.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold every subsequent ledger write for `delay` before it lands.
    pub fn set_write_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms.load(Ordering::SeqCst))
    }

    fn writes_rejected(&self) -> bool {
        self.fail_writes.load(Ordering::SeqCst)
    }
}

impl PlayerDirectory for MemoryStore {
    fn add_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.inner.write().await;
            tables.players.insert(player.id, player);
            Ok(())
        })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.read().await.players.get(&id).cloned()) })
    }

    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.read().await.players.values().cloned().collect()) })
    }

    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.inner.write().await;
            Ok(tables.players.shift_remove(&id).is_some())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok::<(), StorageError>(()) })
    }
}

impl ScoreLedger for MemoryStore {
    fn add_score(&self, score: NewScore) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let delay = store.write_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if store.writes_rejected() {
                return Err(StorageError::unavailable(
                    "memory ledger is read-only".into(),
                    RejectedWrite,
                ));
            }
            let entity = score.into_entity();
            let mut tables = store.inner.write().await;
            tables.scores.insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn delete_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.inner.write().await;
            Ok(tables.scores.shift_remove(&id).is_some())
        })
    }

    fn delete_scores_for_player(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.inner.write().await;
            let before = tables.scores.len();
            tables.scores.retain(|_, score| score.player_id != player_id);
            Ok(before - tables.scores.len())
        })
    }

    fn scores_for_player(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.inner.read().await;
            Ok(tables
                .scores
                .values()
                .filter(|score| score.player_id == player_id)
                .cloned()
                .collect())
        })
    }

    fn recent_scores(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut scores: Vec<_> = store.inner.read().await.scores.values().cloned().collect();
            sort_newest_first(&mut scores);
            scores.truncate(limit);
            Ok::<_, StorageError>(scores)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    fn player(name: &str) -> PlayerEntity {
        PlayerEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            grade: None,
            avatar: "🏹".into(),
            joined_at: SystemTime::now(),
        }
    }

    fn score(player_id: Uuid, grand: u32, age_secs: u64) -> NewScore {
        NewScore {
            player_id,
            recorded_at: SystemTime::now() - Duration::from_secs(age_secs),
            grand,
            near_total: grand,
            far_total: 0,
            near_rounds: [[0; 5]; 3],
            far_rounds: [[0; 5]; 3],
        }
    }

    #[tokio::test]
    async fn players_keep_registration_order() {
        let store = MemoryStore::new();
        let first = player("Ada");
        let second = player("Bo");
        store.add_player(first.clone()).await.unwrap();
        store.add_player(second.clone()).await.unwrap();

        let listed = store.list_players().await.unwrap();
        assert_eq!(listed, vec![first.clone(), second]);

        assert!(store.delete_player(first.id).await.unwrap());
        assert!(!store.delete_player(first.id).await.unwrap());
        assert!(store.find_player(first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recent_scores_are_newest_first_and_limited() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.add_score(score(id, 10, 30)).await.unwrap();
        store.add_score(score(id, 20, 10)).await.unwrap();
        store.add_score(score(id, 30, 20)).await.unwrap();

        let recent = store.recent_scores(2).await.unwrap();
        let grands: Vec<_> = recent.iter().map(|s| s.grand).collect();
        assert_eq!(grands, vec![20, 30]);
    }

    #[tokio::test]
    async fn deleting_scores_for_player_leaves_others() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.add_score(score(a, 1, 0)).await.unwrap();
        store.add_score(score(a, 2, 0)).await.unwrap();
        let kept = store.add_score(score(b, 3, 0)).await.unwrap();

        assert_eq!(store.delete_scores_for_player(a).await.unwrap(), 2);
        assert!(store.scores_for_player(a).await.unwrap().is_empty());
        assert_eq!(store.scores_for_player(b).await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn delayed_writes_still_land() {
        let store = MemoryStore::new();
        store.set_write_delay(Duration::from_millis(20));
        let started = std::time::Instant::now();
        store.add_score(score(Uuid::new_v4(), 5, 0)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(store.recent_scores(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failing_writes_surface_errors() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(store.add_score(score(Uuid::new_v4(), 1, 0)).await.is_err());
        store.set_fail_writes(false);
        assert!(store.add_score(score(Uuid::new_v4(), 1, 0)).await.is_ok());
    }
}
