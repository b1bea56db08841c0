//! Session reaper
//!
//! A background task that ticks on a fixed period and removes idle sessions. It is
//! started once at process start and runs until its shutdown channel fires or is
//! dropped.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::store::SessionStore;

/// Shortest period the reaper will tick at
pub const MIN_REAP_INTERVAL: Duration = Duration::from_millis(1);

/// Counters kept across reaper ticks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaperStats {
    /// Number of ticks since start
    pub tick_count: u64,
    /// Sessions removed since start
    pub total_reaped: u64,
}

impl ReaperStats {
    /// Record one tick and the sessions it removed
    pub fn tick(&mut self, reaped: usize) {
        self.tick_count += 1;
        self.total_reaped += reaped as u64;
    }
}

/// Periodic expiry of idle sessions
pub struct Reaper {
    store: Arc<SessionStore>,
    interval: Duration,
    stats: ReaperStats,
}

impl Reaper {
    /// A zero `interval` is raised to [`MIN_REAP_INTERVAL`]
    pub fn new(store: Arc<SessionStore>, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            warn!("Reaper interval of zero requested, using {:?}", MIN_REAP_INTERVAL);
            MIN_REAP_INTERVAL
        } else {
            interval
        };
        Self {
            store,
            interval,
            stats: ReaperStats::default(),
        }
    }

    /// Run one reap pass
    pub async fn tick(&mut self) -> usize {
        let reaped = self.store.reap_expired().await;
        self.stats.tick(reaped);
        if reaped > 0 {
            info!("Reaper removed {} idle sessions", reaped);
        } else {
            debug!("Reaper tick {}: nothing to remove", self.stats.tick_count);
        }
        reaped
    }

    /// Tick until shutdown is requested
    pub async fn run(mut self, mut shutdown_rx: mpsc::Receiver<()>) -> ReaperStats {
        info!("Session reaper starting (every {:?}, ttl {:?})", self.interval, self.store.ttl());

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Session reaper stopping");
                    break;
                }
            }
        }

        self.stats
    }

    /// Spawn the reaper as a tokio task
    pub fn spawn(store: Arc<SessionStore>, interval: Duration) -> ReaperHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let join = tokio::spawn(Self::new(store, interval).run(shutdown_rx));
        ReaperHandle { shutdown_tx, join }
    }
}

/// Handle to a running reaper task
pub struct ReaperHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<ReaperStats>,
}

impl ReaperHandle {
    /// Stop the reaper and wait for it to finish
    pub async fn shutdown(self) -> ReaperStats {
        let _ = self.shutdown_tx.send(()).await;
        match self.join.await {
            Ok(stats) => stats,
            Err(e) => {
                error!("Session reaper task failed: {}", e);
                ReaperStats::default()
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
