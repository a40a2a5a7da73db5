//! Kubernetes controllers for the Hello CRD
//!
//! This module contains the controller that watches Hello resources and the
//! Pods they own, and hands each change to the Hello reconciler.

mod hello_controller;

pub use hello_controller::run as run_hello_controller;
pub use hello_controller::{error_action, outcome_action};

use std::sync::Arc;

use kube::Client;
use tokio_util::sync::CancellationToken;

use crate::config::OperatorConfig;
use crate::reconcilers::HelloReconciler;
use crate::store::{ControllerOwnerLinker, KubeStore};

/// Shared context for the controller
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Reconcile driver wired to the cluster
    pub reconciler: HelloReconciler,
    /// Operator configuration
    pub config: OperatorConfig,
    /// Cancelled when the operator shuts down
    pub shutdown: CancellationToken,
}

impl Context {
    /// Create a new context backed by the Kubernetes API
    pub fn new(client: Client, config: OperatorConfig, shutdown: CancellationToken) -> Self {
        let reconciler = HelloReconciler::new(
            Arc::new(KubeStore::new(client.clone())),
            Arc::new(ControllerOwnerLinker),
        );
        Self {
            client,
            reconciler,
            config,
            shutdown,
        }
    }
}
