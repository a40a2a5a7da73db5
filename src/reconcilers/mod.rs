//! Reconcilers for Hello resources
//!
//! This module contains the business logic for reconciling a Hello:
//! - The phase state machine (pure decisions)
//! - Work unit Pod construction
//! - The reconcile driver that applies decisions through a resource store

pub mod hello;
pub mod phase;
pub mod work_unit;

pub use hello::{HelloReconciler, ReconcileOutcome};
pub use phase::{decide, Decision, SideEffect, WorkUnitState};
