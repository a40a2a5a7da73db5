//! Hello Custom Resource Definition

use std::fmt;
use std::str::FromStr;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Hello resource specification
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "myapp.freelizhun.com",
    version = "v1",
    kind = "Hello",
    plural = "hellos",
    singular = "hello",
    namespaced,
    status = "HelloStatus",
    printcolumn = r#"{"name": "Times", "type": "integer", "jsonPath": ".spec.times"}"#,
    printcolumn = r#"{"name": "Phase", "type": "string", "jsonPath": ".status.phase"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct HelloSpec {
    /// How many times the work unit prints its greeting
    #[serde(default, alias = "helloTimes")]
    pub times: u32,
}

/// Hello status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelloStatus {
    /// Current phase (Pending, Running, Succeeded, Failed)
    ///
    /// Kept as a plain string so an unknown value reaches the reconciler
    /// instead of failing deserialization of the whole object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// Lifecycle phase of a Hello
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HelloPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl HelloPhase {
    /// Wire name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            HelloPhase::Pending => "Pending",
            HelloPhase::Running => "Running",
            HelloPhase::Succeeded => "Succeeded",
            HelloPhase::Failed => "Failed",
        }
    }

    /// Parse a stored phase, treating an absent or empty value as Pending
    pub fn parse(raw: Option<&str>) -> Result<Self, Error> {
        match raw {
            None | Some("") => Ok(HelloPhase::Pending),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for HelloPhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(HelloPhase::Pending),
            "Running" => Ok(HelloPhase::Running),
            "Succeeded" => Ok(HelloPhase::Succeeded),
            "Failed" => Ok(HelloPhase::Failed),
            other => Err(Error::InvalidPhase(other.to_string())),
        }
    }
}

impl fmt::Display for HelloPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Hello {
    /// Raw phase string as stored, if any
    pub fn phase_str(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.phase.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_absent_phase_normalize_to_pending() {
        assert_eq!(HelloPhase::parse(None).unwrap(), HelloPhase::Pending);
        assert_eq!(HelloPhase::parse(Some("")).unwrap(), HelloPhase::Pending);
    }

    #[test]
    fn test_unknown_phase_is_rejected() {
        let err = HelloPhase::parse(Some("Bogus")).unwrap_err();
        assert!(matches!(err, Error::InvalidPhase(ref p) if p == "Bogus"));
    }

    #[test]
    fn test_phase_names_are_case_sensitive() {
        assert!(HelloPhase::parse(Some("running")).is_err());
        assert_eq!(
            HelloPhase::parse(Some("Running")).unwrap(),
            HelloPhase::Running
        );
    }

    #[test]
    fn test_spec_accepts_legacy_times_key() {
        let spec: HelloSpec = serde_json::from_str(r#"{"helloTimes": 5}"#).unwrap();
        assert_eq!(spec.times, 5);

        let spec: HelloSpec = serde_json::from_str(r#"{"times": 3}"#).unwrap();
        assert_eq!(spec.times, 3);
    }

    #[test]
    fn test_status_wire_shape_is_phase_only() {
        let status = HelloStatus {
            phase: Some(HelloPhase::Running.to_string()),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json, serde_json::json!({ "phase": "Running" }));
    }

    #[test]
    fn test_unknown_phase_survives_deserialization() {
        let status: HelloStatus = serde_json::from_str(r#"{"phase": "Bogus"}"#).unwrap();
        assert_eq!(status.phase.as_deref(), Some("Bogus"));
    }
}
