//! Hello controller
//!
//! Watches Hello resources and their Pods and triggers reconciliation.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::ListParams,
    runtime::{
        controller::{Action, Controller},
        watcher::Config as WatcherConfig,
    },
    Api, ResourceExt,
};
use tracing::{error, info, instrument};

use crate::config::{OperatorConfig, PERMANENT_ERROR_REQUEUE};
use crate::controllers::Context;
use crate::crd::Hello;
use crate::error::{Error, Result};
use crate::metrics;
use crate::reconcilers::ReconcileOutcome;
use crate::store::ObjectKey;

const KIND: &str = "Hello";

/// Run the Hello controller
pub async fn run(context: Arc<Context>) {
    let client = &context.client;
    let (hellos, pods): (Api<Hello>, Api<Pod>) = match context.config.watch_namespace.as_deref() {
        Some(ns) => (
            Api::namespaced(client.clone(), ns),
            Api::namespaced(client.clone(), ns),
        ),
        None => (Api::all(client.clone()), Api::all(client.clone())),
    };

    // Verify CRD is installed
    if let Err(e) = hellos.list(&ListParams::default().limit(1)).await {
        error!("Hello CRD not installed: {}", e);
        return;
    }

    info!(
        namespace = context.config.watch_namespace.as_deref().unwrap_or("*"),
        "Starting Hello controller"
    );

    Controller::new(hellos, WatcherConfig::default())
        .owns(pods, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => {
                    info!(
                        name = %obj.name,
                        namespace = obj.namespace.as_deref().unwrap_or("default"),
                        "Reconciled Hello"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Reconciliation error");
                }
            }
        })
        .await;
}

/// Main reconciliation function
#[instrument(skip(obj, ctx), fields(name = %obj.name_any(), namespace = obj.namespace()))]
async fn reconcile(obj: Arc<Hello>, ctx: Arc<Context>) -> Result<Action> {
    let _timer = metrics::RECONCILE_DURATION
        .with_label_values(&[KIND])
        .start_timer();
    metrics::RECONCILIATIONS.with_label_values(&[KIND]).inc();

    // Only the identity is taken from the event; state is re-read from the store
    let key = ObjectKey::of(obj.as_ref())?;
    let outcome = ctx.reconciler.reconcile(&key, &ctx.shutdown).await?;
    Ok(outcome_action(&outcome, &ctx.config))
}

/// Error policy for the controller
fn error_policy(obj: Arc<Hello>, error: &Error, ctx: Arc<Context>) -> Action {
    metrics::RECONCILIATION_ERRORS
        .with_label_values(&[KIND, error.metric_label()])
        .inc();
    error!(
        name = %obj.name_any(),
        error = %error,
        retryable = error.is_retryable(),
        "Reconciliation failed, scheduling retry"
    );
    error_action(error, &ctx.config)
}

/// Map a reconcile outcome to a scheduling directive
pub fn outcome_action(outcome: &ReconcileOutcome, config: &OperatorConfig) -> Action {
    if outcome.requeue {
        Action::requeue(config.requeue_after)
    } else {
        Action::await_change()
    }
}

/// Map a reconcile error to a scheduling directive
pub fn error_action(error: &Error, config: &OperatorConfig) -> Action {
    let delay: Duration = if error.is_retryable() {
        config.error_requeue_after
    } else {
        PERMANENT_ERROR_REQUEUE
    };
    Action::requeue(delay)
}
