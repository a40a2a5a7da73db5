//! Hello reconciler
//!
//! Drives a Hello through Pending -> Running -> Succeeded/Failed by loading
//! current state, asking the [phase state machine](super::phase) what to do,
//! applying at most one side effect on the work unit Pod, and then writing
//! the new phase. Every invocation starts from what is stored, so it can be
//! repeated or interleaved with other invocations for the same Hello.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::phase::{self, SideEffect};
use super::work_unit;
use crate::crd::{Hello, HelloPhase, HelloStatus};
use crate::error::{Error, Result};
use crate::metrics;
use crate::store::{ObjectKey, OwnerLinker, ResourceStore};

/// Result of one reconcile invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Ask to be invoked again to re-observe a running work unit
    pub requeue: bool,
    /// Phase after this invocation; `None` when the Hello no longer exists
    pub phase: Option<HelloPhase>,
}

impl ReconcileOutcome {
    fn gone() -> Self {
        Self {
            requeue: false,
            phase: None,
        }
    }
}

/// Reconcile driver for Hello resources
pub struct HelloReconciler {
    store: Arc<dyn ResourceStore>,
    linker: Arc<dyn OwnerLinker>,
}

impl HelloReconciler {
    pub fn new(store: Arc<dyn ResourceStore>, linker: Arc<dyn OwnerLinker>) -> Self {
        Self { store, linker }
    }

    /// Run one reconciliation for the Hello identified by `key`.
    ///
    /// Store calls are abandoned with [`Error::Cancelled`] once `cancel`
    /// fires; a call that already completed stays committed.
    #[instrument(skip(self, cancel), fields(namespace = %key.namespace, name = %key.name))]
    pub async fn reconcile(
        &self,
        key: &ObjectKey,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome> {
        info!("Received request");

        let Some(mut hello) = cancellable(cancel, self.store.get_hello(key)).await? else {
            debug!("Hello not found, assuming it was deleted");
            return Ok(ReconcileOutcome::gone());
        };

        let current = HelloPhase::parse(hello.phase_str()).map_err(|e| {
            error!(phase = ?hello.phase_str(), "Invalid phase");
            e
        })?;
        info!(phase = %current, "Check phase");

        let observed = match current {
            HelloPhase::Running => {
                let Some(pod) = cancellable(cancel, self.store.get_pod(key)).await? else {
                    error!("Work unit not found for running Hello");
                    return Err(Error::WorkUnitMissing(key.to_string()));
                };
                Some(work_unit::observe(&pod))
            }
            _ => None,
        };

        let decision = phase::decide(current, observed)?;

        match decision.effect {
            SideEffect::None => {}
            SideEffect::CreateWorkUnit => self.create_work_unit(&hello, cancel).await?,
            SideEffect::DeleteWorkUnit => self.delete_work_unit(key, cancel).await?,
        }

        if decision.changes_phase(current) {
            hello.status = Some(HelloStatus {
                phase: Some(decision.next_phase.to_string()),
            });
            match cancellable(cancel, self.store.update_hello_status(&hello)).await {
                Ok(_) => {}
                Err(Error::NotFound(_)) => {
                    debug!("Hello deleted before status update");
                    return Ok(ReconcileOutcome::gone());
                }
                Err(e) => {
                    warn!(error = %e, "Failed to update Hello status");
                    return Err(e);
                }
            }
            metrics::PHASE_TRANSITIONS
                .with_label_values(&[current.as_str(), decision.next_phase.as_str()])
                .inc();
            info!(from = %current, to = %decision.next_phase, "Updated phase");
        } else if current == HelloPhase::Succeeded {
            info!("Have done!");
        } else {
            debug!(requeue = decision.requeue, "Work unit still executing");
        }

        Ok(ReconcileOutcome {
            requeue: decision.requeue,
            phase: Some(decision.next_phase),
        })
    }

    async fn create_work_unit(&self, hello: &Hello, cancel: &CancellationToken) -> Result<()> {
        let mut pod = work_unit::build(hello);
        self.linker.set_owner(&mut pod, hello).map_err(|e| {
            error!(error = %e, "Failed to set controller reference");
            e
        })?;

        let outcome = match cancellable(cancel, self.store.create_pod(&pod)).await {
            Ok(()) => {
                info!("Created work unit");
                "created"
            }
            // A previous invocation created it but did not get to persist Running
            Err(Error::AlreadyExists(_)) => {
                info!("Work unit already exists");
                "already_exists"
            }
            Err(e) => {
                error!(error = %e, "Failed to create work unit");
                return Err(e);
            }
        };
        metrics::WORK_UNIT_OPERATIONS
            .with_label_values(&["create", outcome])
            .inc();
        Ok(())
    }

    async fn delete_work_unit(&self, key: &ObjectKey, cancel: &CancellationToken) -> Result<()> {
        let outcome = match cancellable(cancel, self.store.delete_pod(key)).await {
            Ok(()) => {
                info!("Deleted work unit");
                "deleted"
            }
            Err(Error::NotFound(_)) => {
                info!("Work unit already gone");
                "not_found"
            }
            Err(e) => {
                error!(error = %e, "Failed to delete work unit");
                return Err(e);
            }
        };
        metrics::WORK_UNIT_OPERATIONS
            .with_label_values(&["delete", outcome])
            .inc();
        Ok(())
    }
}

/// Race a store call against cancellation
async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        res = call => res,
    }
}
