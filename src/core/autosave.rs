//! Periodic flush of the internal vault balance
//!
//! The autosave task runs independently of transaction calls. Each tick reads
//! the current in-memory balance (last write wins) and overwrites the durable
//! snapshot. Writes run on tokio's blocking pool so a slow disk never stalls
//! the runtime workers. A failed write is logged and retried on the next tick.
//!
//! Updates made between the last tick and a crash are lost; shutdown cancels
//! the task and performs one final flush.

use crate::core::traits::VaultStore;
use crate::core::vault::InternalBalance;
use crate::types::StoreError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Handle to a running autosave task
pub struct Autosave {
    balance: InternalBalance,
    store: Arc<dyn VaultStore>,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl std::fmt::Debug for Autosave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Autosave")
            .field("balance", &self.balance.get())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

impl Autosave {
    /// Start flushing `balance` to `store` every `period`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(balance: InternalBalance, store: Arc<dyn VaultStore>, period: Duration) -> Self {
        let token = CancellationToken::new();

        let handle = {
            let balance = balance.clone();
            let store = Arc::clone(&store);
            let token = token.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick completes immediately; nothing has changed yet.
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = interval.tick() => {
                            if let Err(e) = flush(&balance, &store).await {
                                error!(error = %e, "System vault autosave failed");
                            }
                        }
                    }
                }
                debug!("System vault autosave task stopped");
            })
        };

        info!(period_secs = period.as_secs(), "Started system vault autosave");
        Autosave {
            balance,
            store,
            token,
            handle,
        }
    }

    /// Stop the task and write the final snapshot
    pub async fn shutdown(self) -> Result<(), StoreError> {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "System vault autosave task ended abnormally");
        }
        flush(&self.balance, &self.store).await?;
        info!("Flushed system vault on shutdown");
        Ok(())
    }
}

/// Write the current balance to the store on the blocking pool
pub async fn flush(
    balance: &InternalBalance,
    store: &Arc<dyn VaultStore>,
) -> Result<(), StoreError> {
    let snapshot = balance.get();
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || store.save(snapshot))
        .await
        .map_err(StoreError::task)??;
    debug!(balance = %snapshot, "Flushed system vault balance");
    Ok(())
}
