//! Operator configuration
//!
//! Defaults can be overridden through environment variables at startup.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default metrics port
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default delay before re-observing a running work unit
pub const DEFAULT_REQUEUE_SECONDS: u64 = 5;

/// Default delay after a retryable reconcile error
pub const DEFAULT_ERROR_REQUEUE_SECONDS: u64 = 30;

/// Delay after an error that needs human attention
pub const PERMANENT_ERROR_REQUEUE: Duration = Duration::from_secs(300);

/// Runtime configuration for the operator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// Delay used when the reconciler asks to requeue
    pub requeue_after: Duration,
    /// Delay after retryable errors
    pub error_requeue_after: Duration,
    /// Restrict the controller to one namespace
    pub watch_namespace: Option<String>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            requeue_after: Duration::from_secs(DEFAULT_REQUEUE_SECONDS),
            error_requeue_after: Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECONDS),
            watch_namespace: None,
        }
    }
}

impl OperatorConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let metrics_port = match lookup("METRICS_PORT") {
            Some(v) => parse_var("METRICS_PORT", &v)?,
            None => defaults.metrics_port,
        };
        let requeue_after = match lookup("HELLO_REQUEUE_SECONDS") {
            Some(v) => Duration::from_secs(parse_var("HELLO_REQUEUE_SECONDS", &v)?),
            None => defaults.requeue_after,
        };
        let error_requeue_after = match lookup("HELLO_ERROR_REQUEUE_SECONDS") {
            Some(v) => Duration::from_secs(parse_var("HELLO_ERROR_REQUEUE_SECONDS", &v)?),
            None => defaults.error_requeue_after,
        };
        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty());

        Ok(Self {
            metrics_port,
            requeue_after,
            error_requeue_after,
            watch_namespace,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::config(format!("Invalid {} '{}': {}", name, value, e)))
}
