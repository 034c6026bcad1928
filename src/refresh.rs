//! Periodic wind field refresh
//!
//! Runs the resolver on a fixed interval in a background task and delivers
//! each cycle's records over a tokio channel. A cycle is awaited before the
//! next tick is taken, so at most one run is in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::data::{ForecastSource, Site, SiteWindResult};
use crate::resolver::WindFieldResolver;

/// Messages sent from the background refresh task
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// Refresh started
    RefreshStarted,
    /// A cycle finished; supersedes every earlier result
    WindUpdated(Vec<SiteWindResult>),
    /// No site resolved this cycle; earlier results still stand
    RefreshError(String),
    /// Refresh completed
    RefreshCompleted,
}

/// Configuration for the refresh loop
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between cycle starts
    pub interval: Duration,
    /// Sites still pending this long after a cycle starts are dropped
    pub run_timeout: Duration,
    /// Run the first cycle immediately instead of after one interval
    pub run_immediately: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600), // 10 minutes
            run_timeout: Duration::from_secs(60),
            run_immediately: true,
        }
    }
}

/// Handle for controlling the background refresh task
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Flag to signal shutdown
    shutdown_tx: mpsc::Sender<()>,
    /// Used to request an out-of-schedule cycle
    trigger_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns the refresh task for `sites`
    ///
    /// # Returns
    /// A RefreshHandle that receives updates via the `receiver` channel
    pub fn spawn<S>(
        resolver: Arc<WindFieldResolver<S>>,
        sites: Vec<Site>,
        config: RefreshConfig,
    ) -> Self
    where
        S: ForecastSource + 'static,
    {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            if !config.run_immediately {
                // Skip the first tick (immediate)
                interval.tick().await;
            }

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    Some(()) = trigger_rx.recv() => {
                        interval.reset();
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }

                let _ = msg_tx.send(RefreshMessage::RefreshStarted).await;
                let message = tokio::select! {
                    report = resolver.resolve_report_within(&sites, config.run_timeout) => {
                        if report.results.is_empty() && !report.failures.is_empty() {
                            warn!(failed = report.failures.len(), "no site resolved this cycle");
                            RefreshMessage::RefreshError(format!(
                                "all {} sites failed to resolve",
                                report.failures.len()
                            ))
                        } else {
                            RefreshMessage::WindUpdated(report.results)
                        }
                    },
                    _ = shutdown_rx.recv() => {
                        info!("refresh shut down during a cycle");
                        break;
                    }
                };
                let _ = msg_tx.send(message).await;
                if msg_tx.send(RefreshMessage::RefreshCompleted).await.is_err() {
                    // Receiver dropped; nobody is listening anymore
                    break;
                }
            }
        });

        Self {
            receiver: msg_rx,
            shutdown_tx,
            trigger_tx,
        }
    }

    /// Requests an immediate cycle; ignored while one is already pending
    pub fn request_refresh(&self) {
        let _ = self.trigger_tx.try_send(());
    }

    /// Shuts down the background refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Checks for pending refresh messages without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
