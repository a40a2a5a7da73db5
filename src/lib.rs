//! Hello Kubernetes Operator
//!
//! This operator runs each `Hello` custom resource as a Pod and tracks the
//! Pod's progress in the Hello's status phase.

pub mod config;
pub mod controllers;
pub mod crd;
pub mod error;
pub mod metrics;
pub mod reconcilers;
pub mod store;

pub use error::{Error, Result};
