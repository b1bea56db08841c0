//! Canvas orchestration
//!
//! One request runs as two scatter/gather waves: the planner writes a tool call for
//! every tile, then every tool call is dispatched. Each wave spawns one task per tile
//! and joins the handles in plan order, so output order never depends on which task
//! finishes first. A failure in one tile is logged and costs only that tile.

use std::future::Future;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use futures::future::join_all;
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::error::{CanvasError, Result};
use crate::planner::Planner;
use crate::session::SessionStore;
use crate::tools::ToolDispatcher;

use super::archive::CanvasArchive;
use super::tile::{Tile, TileType};

/// Anchor date handed to the planner: yesterday for time series, empty otherwise
pub fn anchor_date(tile_type: TileType, today: NaiveDate) -> String {
    if !tile_type.is_time_series() {
        return String::new();
    }
    today.pred_opt().unwrap_or(today).format("%Y-%m-%d").to_string()
}

/// Spawn every future and collect the results index-aligned with the input
pub async fn gather<T, F>(tasks: Vec<F>) -> Vec<Result<T>>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    let handles: Vec<JoinHandle<Result<T>>> = tasks.into_iter().map(tokio::spawn).collect();

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap_or_else(|e| Err(CanvasError::Task(e.to_string()))))
        .collect()
}

/// Builds canvases and stores them in sessions
pub struct CanvasOrchestrator<P: Planner + 'static> {
    planner: Arc<P>,
    dispatcher: Arc<ToolDispatcher>,
    store: Arc<SessionStore>,
    archive: Option<CanvasArchive>,
}

impl<P: Planner + 'static> CanvasOrchestrator<P> {
    pub fn new(planner: Arc<P>, dispatcher: Arc<ToolDispatcher>, store: Arc<SessionStore>) -> Self {
        Self {
            planner,
            dispatcher,
            store,
            archive: None,
        }
    }

    /// Also write every generated batch to disk
    pub fn with_archive(mut self, archive: Option<CanvasArchive>) -> Self {
        self.archive = archive;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Generate a canvas for `user_input` and append it to the session
    pub async fn generate_canvas(&self, session_id: &str, user_input: &str, context: &str) -> Result<Vec<Tile>> {
        self.generate_canvas_on(session_id, user_input, context, Local::now().date_naive())
            .await
    }

    /// Same as [`generate_canvas`](Self::generate_canvas) with an explicit "today"
    pub async fn generate_canvas_on(
        &self,
        session_id: &str,
        user_input: &str,
        context: &str,
        today: NaiveDate,
    ) -> Result<Vec<Tile>> {
        info!(
            "Generating canvas for session {} with user input: {} and context: {}",
            session_id, user_input, context
        );

        let plan = self.planner.generate_canvas(user_input, context).await?;
        info!("Planner returned {} tiles", plan.tiles.len());

        let tool_calls = gather(
            plan.tiles
                .iter()
                .map(|spec| {
                    let planner = self.planner.clone();
                    let spec = spec.clone();
                    let context = context.to_string();
                    let date = anchor_date(spec.tile_type, today);
                    async move { planner.generate_tool_call(&spec, &context, &date).await }
                })
                .collect(),
        )
        .await;

        let results = gather(
            tool_calls
                .into_iter()
                .map(|call| {
                    let dispatcher = self.dispatcher.clone();
                    async move {
                        match call {
                            Ok(call) => {
                                debug!("Generated tool call: {:?}", call);
                                dispatcher.dispatch(call).await
                            }
                            Err(e) => Err(e),
                        }
                    }
                })
                .collect(),
        )
        .await;

        let mut tiles = Vec::with_capacity(plan.tiles.len());
        for (spec, result) in plan.tiles.into_iter().zip(results) {
            match result {
                Ok(data) => {
                    let position = tiles.len();
                    tiles.push(Tile::from_spec(spec, data, position));
                }
                Err(e) => warn!("Dropping tile '{}': {}", spec.title, e),
            }
        }

        info!("Canvas for session {} has {} tiles", session_id, tiles.len());

        self.store.append_tiles(session_id, tiles.clone()).await;

        if let Some(archive) = &self.archive {
            if let Err(e) = archive.save(&tiles).await {
                warn!("Failed to archive canvas: {}", e);
            }
        }

        Ok(tiles)
    }
}
