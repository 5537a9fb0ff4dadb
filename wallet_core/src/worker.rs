//! Detached self-claim jobs.
//!
//! After a transfer is acknowledged, bounties it paid to this wallet's own
//! claimants (change, self-sends) are claimed in the background. Jobs run
//! one at a time under the engine's operation lock; failures are logged and
//! left for the next sync to retry.

use std::sync::Weak;

use hookpay_messages::{Bounty, Claimable, Hashable};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::claim::ClaimOutcome;
use crate::engine::Engine;

pub(crate) enum Job {
    Claim(Bounty),
    Flush(oneshot::Sender<()>),
}

pub(crate) struct SelfClaimQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl SelfClaimQueue {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<Job>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub(crate) fn enqueue(&self, bounty: Bounty) {
        let hash = bounty.hash();
        if self.tx.send(Job::Claim(bounty)).is_err() {
            warn!(bounty = %hash, "self-claim worker is gone, leaving bounty for sync");
        }
    }

    /// Resolves once every job queued before the call has run.
    pub(crate) async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Job::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

pub(crate) fn spawn(engine: Weak<Engine>, mut jobs: mpsc::UnboundedReceiver<Job>) {
    tokio::spawn(async move {
        while let Some(job) = jobs.recv().await {
            match job {
                Job::Claim(bounty) => {
                    let Some(engine) = engine.upgrade() else {
                        break;
                    };
                    let hash = bounty.hash();
                    let _guard = engine.op_lock.lock().await;
                    match engine.claim_claimable(Claimable::Bounty(bounty)).await {
                        Ok(ClaimOutcome::Claimed { coins }) => {
                            debug!(bounty = %hash, coins = coins.len(), "self-claimed bounty")
                        }
                        Ok(ClaimOutcome::AlreadyClaimed) => {}
                        Err(e) => warn!(bounty = %hash, error = %e, "self-claim failed"),
                    }
                }
                Job::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!("self-claim worker stopped");
    });
}
