use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use tokio::{fs, sync::Mutex};
use uuid::Uuid;

use super::{
    config::FileConfig,
    error::{FileResult, FileStoreError},
};
use crate::dao::{
    models::{NewScore, PlayerEntity, ScoreEntity, sort_newest_first},
    store::{PlayerDirectory, ScoreLedger},
    storage::StorageResult,
};

const PLAYERS_DOCUMENT: &str = "players.json";
const SCORES_DOCUMENT: &str = "scores.json";

/// Local store keeping each collection as one JSON document on disk.
///
/// Writes are read-modify-write cycles serialized behind a single gate and land
/// through a temporary file plus rename, so readers never observe a torn document.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<FileInner>,
}

struct FileInner {
    data_dir: PathBuf,
    write_gate: Mutex<()>,
}

impl FileStore {
    /// Open (and create when missing) the data directory.
    pub async fn open(config: FileConfig) -> FileResult<Self> {
        fs::create_dir_all(&config.data_dir)
            .await
            .map_err(|source| FileStoreError::CreateDir {
                path: config.data_dir.clone(),
                source,
            })?;

        Ok(Self {
            inner: Arc::new(FileInner {
                data_dir: config.data_dir,
                write_gate: Mutex::new(()),
            }),
        })
    }

    fn path(&self, document: &str) -> PathBuf {
        self.inner.data_dir.join(document)
    }

    async fn read_collection<T>(&self, document: &str) -> FileResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = self.path(document);
        match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| FileStoreError::Decode { path, source })
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(FileStoreError::Read { path, source }),
        }
    }

    async fn write_collection<T>(&self, document: &str, items: &[T]) -> FileResult<()>
    where
        T: Serialize,
    {
        let path = self.path(document);
        let payload = serde_json::to_vec_pretty(items).map_err(|source| FileStoreError::Encode {
            path: path.clone(),
            source,
        })?;

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, payload)
            .await
            .map_err(|source| FileStoreError::Write {
                path: staging.clone(),
                source,
            })?;
        fs::rename(&staging, &path)
            .await
            .map_err(|source| FileStoreError::Write { path, source })
    }

    async fn update_collection<T, R, F>(&self, document: &str, update: F) -> FileResult<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> R,
    {
        let _gate = self.inner.write_gate.lock().await;
        let mut items = self.read_collection(document).await?;
        let result = update(&mut items);
        self.write_collection(document, &items).await?;
        Ok(result)
    }
}

impl PlayerDirectory for FileStore {
    fn add_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_collection(PLAYERS_DOCUMENT, |players: &mut Vec<PlayerEntity>| {
                    players.push(player)
                })
                .await
                .map_err(Into::into)
        })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let players = store
                .read_collection::<PlayerEntity>(PLAYERS_DOCUMENT)
                .await?;
            Ok(players.into_iter().find(|player| player.id == id))
        })
    }

    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .read_collection(PLAYERS_DOCUMENT)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_collection(PLAYERS_DOCUMENT, |players: &mut Vec<PlayerEntity>| {
                    let before = players.len();
                    players.retain(|player| player.id != id);
                    players.len() != before
                })
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let path = store.inner.data_dir.clone();
            fs::metadata(&path)
                .await
                .map(|_| ())
                .map_err(|source| FileStoreError::Read { path, source }.into())
        })
    }
}

impl ScoreLedger for FileStore {
    fn add_score(&self, score: NewScore) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let entity = score.into_entity();
            let stored = entity.clone();
            store
                .update_collection(SCORES_DOCUMENT, |scores: &mut Vec<ScoreEntity>| {
                    scores.push(stored)
                })
                .await?;
            Ok(entity)
        })
    }

    fn delete_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_collection(SCORES_DOCUMENT, |scores: &mut Vec<ScoreEntity>| {
                    let before = scores.len();
                    scores.retain(|score| score.id != id);
                    scores.len() != before
                })
                .await
                .map_err(Into::into)
        })
    }

    fn delete_scores_for_player(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_collection(SCORES_DOCUMENT, |scores: &mut Vec<ScoreEntity>| {
                    let before = scores.len();
                    scores.retain(|score| score.player_id != player_id);
                    before - scores.len()
                })
                .await
                .map_err(Into::into)
        })
    }

    fn scores_for_player(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let scores = store
                .read_collection::<ScoreEntity>(SCORES_DOCUMENT)
                .await?;
            Ok(scores
                .into_iter()
                .filter(|score| score.player_id == player_id)
                .collect())
        })
    }

    fn recent_scores(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut scores = store
                .read_collection::<ScoreEntity>(SCORES_DOCUMENT)
                .await?;
            sort_newest_first(&mut scores);
            scores.truncate(limit);
            Ok(scores)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::storage::StorageError;

    fn player(name: &str) -> PlayerEntity {
        PlayerEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            grade: Some("Adult".into()),
            avatar: "🦅".into(),
            joined_at: SystemTime::now(),
        }
    }

    fn score(player_id: Uuid, grand: u32) -> NewScore {
        NewScore {
            player_id,
            recorded_at: SystemTime::now(),
            grand,
            near_total: grand,
            far_total: 0,
            near_rounds: [[1; 5]; 3],
            far_rounds: [[0; 5]; 3],
        }
    }

    #[tokio::test]
    async fn documents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(FileConfig::new(dir.path())).await.unwrap();
        let archer = player("Merida");
        store.add_player(archer.clone()).await.unwrap();
        let saved = store.add_score(score(archer.id, 15)).await.unwrap();

        let reopened = FileStore::open(FileConfig::new(dir.path())).await.unwrap();
        assert_eq!(reopened.list_players().await.unwrap(), vec![archer.clone()]);
        assert_eq!(
            reopened.scores_for_player(archer.id).await.unwrap(),
            vec![saved]
        );
    }

    #[tokio::test]
    async fn missing_documents_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(FileConfig::new(dir.path().join("nested")))
            .await
            .unwrap();
        assert!(store.list_players().await.unwrap().is_empty());
        assert!(store.recent_scores(5).await.unwrap().is_empty());
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn deletes_report_whether_anything_changed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(FileConfig::new(dir.path())).await.unwrap();
        let archer = player("Hawk");
        store.add_player(archer.clone()).await.unwrap();
        let first = store.add_score(score(archer.id, 10)).await.unwrap();
        store.add_score(score(archer.id, 20)).await.unwrap();

        assert!(store.delete_score(first.id).await.unwrap());
        assert!(!store.delete_score(first.id).await.unwrap());
        assert_eq!(store.delete_scores_for_player(archer.id).await.unwrap(), 1);
        assert!(store.delete_player(archer.id).await.unwrap());
        assert!(store.find_player(archer.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_document_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PLAYERS_DOCUMENT), b"{not json").unwrap();
        let store = FileStore::open(FileConfig::new(dir.path())).await.unwrap();

        let err = store.list_players().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }
}
