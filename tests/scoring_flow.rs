use std::{sync::Arc, time::Duration};

use archery_score_back::{
    config::AppConfig,
    dao::store::{
        ScoreLedger,
        file::{FileConfig, FileStore},
    },
    dto::{player::CreatePlayerRequest, session::StartSessionRequest},
    services::{player_service, score_service, session_service},
    state::{AppState, SharedState, engine::ScoringAction},
};
use serde_json::json;
use uuid::Uuid;

const CELLS: usize = 15;

async fn register(state: &SharedState, name: &str) -> Uuid {
    player_service::create_player(
        state,
        CreatePlayerRequest {
            name: name.into(),
            grade: None,
            avatar: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn act(state: &SharedState, session: Uuid, action: ScoringAction) -> bool {
    session_service::apply_action(state, session, action)
        .await
        .unwrap()
        .applied
}

async fn finish_active(state: &SharedState, session: Uuid, near: u8, far: u8) {
    for _ in 0..CELLS {
        assert!(act(state, session, ScoringAction::RecordShot(near)).await);
    }
    assert!(act(state, session, ScoringAction::ConfirmDistance).await);
    for _ in 0..CELLS {
        assert!(act(state, session, ScoringAction::RecordShot(far)).await);
    }
    assert!(act(state, session, ScoringAction::ConfirmDistance).await);
}

async fn wait_for_scores(store: &FileStore, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while store.recent_scores(100).await.unwrap().len() < expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("scores were not persisted in time");
}

#[tokio::test]
async fn tournament_results_reach_the_file_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(FileConfig::new(dir.path())).await.unwrap();
    let config = AppConfig::default().with_completion_delay(Duration::from_millis(5));
    let state = AppState::new(Arc::new(store.clone()), Arc::new(store.clone()), config);

    let robin = register(&state, "Robin").await;
    let marian = register(&state, "Marian").await;

    // ids encoded the way a navigation parameter would carry them
    let encoded = serde_json::to_string(&json!([robin, Uuid::new_v4(), marian])).unwrap();
    let session = session_service::start_session(
        &state,
        StartSessionRequest {
            player_ids: json!(encoded),
        },
    )
    .await
    .unwrap();
    assert_eq!(session.players.len(), 2);

    // Robin: a last-shot correction before confirming the near distance
    for _ in 0..CELLS {
        act(&state, session.id, ScoringAction::RecordShot(8)).await;
    }
    assert!(act(&state, session.id, ScoringAction::RejectConfirmation).await);
    assert!(act(&state, session.id, ScoringAction::RecordShot(10)).await);
    assert!(act(&state, session.id, ScoringAction::ConfirmDistance).await);
    for _ in 0..CELLS {
        act(&state, session.id, ScoringAction::RecordShot(6)).await;
    }
    assert!(act(&state, session.id, ScoringAction::ConfirmDistance).await);
    assert!(act(&state, session.id, ScoringAction::AcknowledgeReward).await);

    finish_active(&state, session.id, 9, 7).await;
    assert!(act(&state, session.id, ScoringAction::AcknowledgeReward).await);

    wait_for_scores(&store, 2).await;

    let recent = score_service::recent_scores(&state, None).await.unwrap();
    let mut by_name: Vec<_> = recent
        .iter()
        .map(|item| (item.player_name.clone().unwrap(), item.score.grand))
        .collect();
    by_name.sort();
    assert_eq!(
        by_name,
        vec![
            ("Marian".to_string(), 9 * 15 + 7 * 15),
            ("Robin".to_string(), 8 * 14 + 10 + 6 * 15),
        ]
    );

    // completion drops the session from the registry
    tokio::time::timeout(Duration::from_secs(2), async {
        while !state.sessions().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session was not released after completion");

    let profile = player_service::player_profile(&state, robin).await.unwrap();
    assert_eq!(profile.best, Some(212));
    assert_eq!(profile.average, Some(212));
}
