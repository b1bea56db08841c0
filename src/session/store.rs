//! In-memory session store
//!
//! Maps a client-supplied session id to its last-touched time and tile list. All
//! access goes through one `RwLock`, so a batch append and a reaper delete can
//! never interleave.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::RwLock;

use crate::canvas::Tile;
use crate::config::SessionConfig;
use crate::error::CanvasError;
use crate::id::{Clock, SystemClock};

/// One client conversation
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub last_touched_ms: u64,
    pub tiles: Vec<Tile>,
}

impl Session {
    fn new(id: &str, now_ms: u64) -> Self {
        Self {
            id: id.to_string(),
            last_touched_ms: now_ms,
            tiles: Vec::new(),
        }
    }

    /// Idle for strictly longer than `ttl` at `now_ms`
    pub fn is_expired(&self, now_ms: u64, ttl: Duration) -> bool {
        now_ms.saturating_sub(self.last_touched_ms) > ttl.as_millis() as u64
    }
}

/// Process-wide session map with timestamp-based expiry
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
    max_sessions: usize,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    /// Create a store with the given TTL and advisory size cap
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            max_sessions,
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a store from configuration
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.ttl(), config.max_sessions)
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Idle time after which a session is reaped
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn session_exists(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Insert an empty session; the size cap only produces a warning
    pub async fn create_session(&self, id: &str) {
        let now = self.clock.now_ms();
        let mut sessions = self.sessions.write().await;

        if sessions.len() >= self.max_sessions {
            warn!(
                "Maximum number of sessions exceeded ({} >= {})",
                sessions.len(),
                self.max_sessions
            );
        }

        sessions.insert(id.to_string(), Session::new(id, now));
        debug!("Created session {}", id);
    }

    /// Tiles of a session, empty when the id is unknown
    pub async fn get_session(&self, id: &str) -> Vec<Tile> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|s| s.tiles.clone())
            .unwrap_or_default()
    }

    /// Refresh the last-touched time of an existing session
    pub async fn touch(&self, id: &str) {
        let now = self.clock.now_ms();
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.last_touched_ms = now;
        }
    }

    /// Append a whole batch of tiles
    ///
    /// Returns `false` and drops the batch when the session no longer exists.
    pub async fn append_tiles(&self, id: &str, tiles: Vec<Tile>) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) => {
                debug!("Appending {} tiles to session {}", tiles.len(), id);
                session.tiles.extend(tiles);
                true
            }
            None => {
                warn!("{}; dropping {} tiles", CanvasError::SessionRace(id.to_string()), tiles.len());
                false
            }
        }
    }

    /// Remove every session idle for longer than the TTL
    pub async fn reap_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|id, session| {
            let expired = session.is_expired(now, self.ttl);
            if expired {
                info!("Reaping idle session {}", id);
            }
            !expired
        });

        before - sessions.len()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("ttl", &self.ttl)
            .field("max_sessions", &self.max_sessions)
            .finish()
    }
}
