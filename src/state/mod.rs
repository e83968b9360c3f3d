pub mod controller;
pub mod engine;
pub mod scoring;
mod sse;
pub mod stats;

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::store::{PlayerDirectory, ScoreLedger},
    state::controller::SessionController,
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Capacity of the broadcast channel feeding SSE subscribers.
const SSE_CAPACITY: usize = 64;

/// Central application state: storage handles, running sessions and the SSE hub.
pub struct AppState {
    players: Arc<dyn PlayerDirectory>,
    ledger: Arc<dyn ScoreLedger>,
    sessions: DashMap<Uuid, Arc<SessionController>>,
    sse: SseHub,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        players: Arc<dyn PlayerDirectory>,
        ledger: Arc<dyn ScoreLedger>,
        config: AppConfig,
    ) -> SharedState {
        Arc::new(Self {
            players,
            ledger,
            sessions: DashMap::new(),
            sse: SseHub::new(SSE_CAPACITY),
            config,
        })
    }

    pub fn players(&self) -> &Arc<dyn PlayerDirectory> {
        &self.players
    }

    pub fn ledger(&self) -> &Arc<dyn ScoreLedger> {
        &self.ledger
    }

    /// Registry of running sessions keyed by their identifier.
    pub fn sessions(&self) -> &DashMap<Uuid, Arc<SessionController>> {
        &self.sessions
    }

    /// Look up a running session, cloning its handle out of the registry.
    pub fn session(&self, id: Uuid) -> Option<Arc<SessionController>> {
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Broadcast hub used for the SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
