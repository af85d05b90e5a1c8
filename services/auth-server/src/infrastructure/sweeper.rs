//! 过期 nonce 定期清理

use std::sync::Arc;
use std::time::Duration;

use authgate_telemetry::names;
use metrics::counter;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::AuthController;

pub struct NonceSweeper {
    controller: Arc<AuthController>,
    interval: Duration,
}

impl NonceSweeper {
    pub fn new(controller: Arc<AuthController>, interval: Duration) -> Self {
        Self {
            controller,
            interval,
        }
    }

    pub fn start(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "Nonce sweeper started");
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.sweep_once().await,
                    _ = shutdown.cancelled() => {
                        info!("Nonce sweeper received shutdown signal");
                        break;
                    }
                }
            }
            info!("Nonce sweeper stopped");
        })
    }

    async fn sweep_once(&self) {
        match self.controller.sweep_expired_nonces().await {
            Ok(removed) => {
                counter!(names::NONCE_SWEEPS, "outcome" => "success").increment(1);
                debug!(removed, "Nonce sweep finished");
            }
            Err(e) => {
                counter!(names::NONCE_SWEEPS, "outcome" => "failure").increment(1);
                warn!(error = %e, "Nonce sweep failed");
            }
        }
    }
}
