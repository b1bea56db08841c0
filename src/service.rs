//! Canvas service - the operations an outer transport layer calls
//!
//! Authentication and routing live outside this crate; they only need to make sure
//! a session exists, read it back, and run a prompt against it.

use std::sync::Arc;

use log::info;

use crate::canvas::{CanvasOrchestrator, Tile};
use crate::error::Result;
use crate::planner::Planner;
use crate::session::SessionStore;

/// Session-scoped entry points over the orchestrator
pub struct CanvasService<P: Planner + 'static> {
    store: Arc<SessionStore>,
    orchestrator: CanvasOrchestrator<P>,
}

impl<P: Planner + 'static> CanvasService<P> {
    pub fn new(orchestrator: CanvasOrchestrator<P>) -> Self {
        Self {
            store: orchestrator.store().clone(),
            orchestrator,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn orchestrator(&self) -> &CanvasOrchestrator<P> {
        &self.orchestrator
    }

    /// Create the session when it is unknown
    pub async fn ensure_session(&self, session_id: &str) {
        if !self.store.session_exists(session_id).await {
            info!("Session {} does not exist, creating a new session", session_id);
            self.store.create_session(session_id).await;
        }
    }

    /// Tiles generated so far, empty for unknown sessions
    pub async fn get_session(&self, session_id: &str) -> Vec<Tile> {
        self.store.get_session(session_id).await
    }

    /// Refresh the session and generate a canvas for `prompt` into it
    pub async fn touch_and_run(&self, session_id: &str, prompt: &str) -> Result<Vec<Tile>> {
        self.store.touch(session_id).await;
        let tiles = self.orchestrator.generate_canvas(session_id, prompt, "").await?;
        info!("Workflow finished for session {} with prompt: {}", session_id, prompt);
        Ok(tiles)
    }
}
