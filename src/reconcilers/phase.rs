//! Phase state machine for Hello resources
//!
//! Pure decision logic: given the current phase and what is observed of the
//! work unit Pod, pick the next phase, the single side effect to perform,
//! and whether the caller should look again later. No I/O happens here.

use crate::crd::HelloPhase;
use crate::error::{Error, Result};

/// Observed execution state of a work unit Pod
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkUnitState {
    Unknown,
    Running,
    Succeeded,
    Failed,
}

/// Side effect the driver must apply before persisting the next phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SideEffect {
    None,
    CreateWorkUnit,
    DeleteWorkUnit,
}

/// Outcome of one state machine step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub next_phase: HelloPhase,
    pub effect: SideEffect,
    pub requeue: bool,
}

impl Decision {
    fn advance(next_phase: HelloPhase, effect: SideEffect) -> Self {
        Self {
            next_phase,
            effect,
            requeue: false,
        }
    }

    fn stay(phase: HelloPhase, requeue: bool) -> Self {
        Self {
            next_phase: phase,
            effect: SideEffect::None,
            requeue,
        }
    }

    /// Whether applying this decision moves the resource off `current`
    pub fn changes_phase(&self, current: HelloPhase) -> bool {
        self.next_phase != current
    }
}

/// Decide the next step for a Hello.
///
/// `observed` is only consulted for `Running`; there a missing Pod means the
/// Pending step never created one, which is surfaced instead of guessed at.
pub fn decide(phase: HelloPhase, observed: Option<WorkUnitState>) -> Result<Decision> {
    let decision = match phase {
        HelloPhase::Pending => Decision::advance(HelloPhase::Running, SideEffect::CreateWorkUnit),
        HelloPhase::Running => match observed {
            None => {
                return Err(Error::WorkUnitMissing(
                    "no work unit observed while Running".to_string(),
                ))
            }
            Some(WorkUnitState::Succeeded) => {
                Decision::advance(HelloPhase::Succeeded, SideEffect::None)
            }
            Some(WorkUnitState::Failed) => Decision::advance(HelloPhase::Failed, SideEffect::None),
            Some(WorkUnitState::Running) | Some(WorkUnitState::Unknown) => {
                Decision::stay(HelloPhase::Running, true)
            }
        },
        HelloPhase::Succeeded => Decision::stay(HelloPhase::Succeeded, false),
        HelloPhase::Failed => Decision::advance(HelloPhase::Pending, SideEffect::DeleteWorkUnit),
    };
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide_raw(raw_phase: Option<&str>, observed: Option<WorkUnitState>) -> Result<Decision> {
        decide(HelloPhase::parse(raw_phase)?, observed)
    }

    #[test]
    fn test_pending_creates_work_unit_and_runs() {
        let d = decide(HelloPhase::Pending, None).unwrap();
        assert_eq!(d.next_phase, HelloPhase::Running);
        assert_eq!(d.effect, SideEffect::CreateWorkUnit);
        assert!(!d.requeue);
    }

    #[test]
    fn test_pending_ignores_stale_observation() {
        let d = decide(HelloPhase::Pending, Some(WorkUnitState::Failed)).unwrap();
        assert_eq!(d.effect, SideEffect::CreateWorkUnit);
        assert_eq!(d.next_phase, HelloPhase::Running);
    }

    #[test]
    fn test_empty_phase_behaves_as_pending() {
        let d = decide_raw(Some(""), None).unwrap();
        assert_eq!(d.effect, SideEffect::CreateWorkUnit);
        let d = decide_raw(None, None).unwrap();
        assert_eq!(d.next_phase, HelloPhase::Running);
    }

    #[test]
    fn test_running_without_work_unit_is_error() {
        let err = decide(HelloPhase::Running, None).unwrap_err();
        assert!(matches!(err, Error::WorkUnitMissing(_)));
    }

    #[test]
    fn test_running_follows_terminal_work_unit_states() {
        let d = decide(HelloPhase::Running, Some(WorkUnitState::Succeeded)).unwrap();
        assert_eq!(d, Decision::advance(HelloPhase::Succeeded, SideEffect::None));

        let d = decide(HelloPhase::Running, Some(WorkUnitState::Failed)).unwrap();
        assert_eq!(d, Decision::advance(HelloPhase::Failed, SideEffect::None));
    }

    #[test]
    fn test_running_requeues_while_work_unit_executes() {
        for state in [WorkUnitState::Running, WorkUnitState::Unknown] {
            let d = decide(HelloPhase::Running, Some(state)).unwrap();
            assert_eq!(d.next_phase, HelloPhase::Running);
            assert_eq!(d.effect, SideEffect::None);
            assert!(d.requeue, "expected requeue for {:?}", state);
            assert!(!d.changes_phase(HelloPhase::Running));
        }
    }

    #[test]
    fn test_succeeded_is_absorbing() {
        for observed in [
            None,
            Some(WorkUnitState::Failed),
            Some(WorkUnitState::Running),
        ] {
            let d = decide(HelloPhase::Succeeded, observed).unwrap();
            assert_eq!(d, Decision::stay(HelloPhase::Succeeded, false));
        }
    }

    #[test]
    fn test_failed_deletes_work_unit_and_retries() {
        let d = decide(HelloPhase::Failed, None).unwrap();
        assert_eq!(d.next_phase, HelloPhase::Pending);
        assert_eq!(d.effect, SideEffect::DeleteWorkUnit);
        assert!(!d.requeue);
        assert!(d.changes_phase(HelloPhase::Failed));
    }

    #[test]
    fn test_invalid_phase_is_error() {
        let err = decide_raw(Some("Bogus"), Some(WorkUnitState::Succeeded)).unwrap_err();
        assert!(matches!(err, Error::InvalidPhase(_)));
    }
}
