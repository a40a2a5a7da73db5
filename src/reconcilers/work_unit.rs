//! Work unit Pod construction and observation

use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::crd::Hello;
use crate::reconcilers::phase::WorkUnitState;

/// Container name inside the work unit Pod
pub const CONTAINER_NAME: &str = "ubuntu";

/// Image the work unit runs
pub const IMAGE: &str = "busybox";

/// Shell line that prints the greeting `times` times
pub fn command_line(times: u32) -> String {
    format!("seq {} | xargs -I{{}} echo \"Hello\"", times)
}

/// Build the work unit Pod for a Hello.
///
/// Same Hello in, same Pod out: the Pod shares the Hello's namespace and name
/// and its only input is `spec.times`. Owner references are attached
/// separately by the [`OwnerLinker`](crate::store::OwnerLinker).
pub fn build(hello: &Hello) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: hello.metadata.name.clone(),
            namespace: hello.metadata.namespace.clone(),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: CONTAINER_NAME.to_string(),
                image: Some(IMAGE.to_string()),
                command: Some(vec![
                    "/bin/sh".to_string(),
                    "-c".to_string(),
                    command_line(hello.spec.times),
                ]),
                ..Default::default()
            }],
            restart_policy: Some("OnFailure".to_string()),
            ..Default::default()
        }),
        status: None,
    }
}

/// Map the Pod phase onto the coarser work unit state
pub fn observe(pod: &Pod) -> WorkUnitState {
    let phase = pod.status.as_ref().and_then(|s| s.phase.as_deref());
    match phase {
        Some("Succeeded") => WorkUnitState::Succeeded,
        Some("Failed") => WorkUnitState::Failed,
        Some("Running") => WorkUnitState::Running,
        _ => WorkUnitState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::HelloSpec;
    use k8s_openapi::api::core::v1::PodStatus;

    fn hello(times: u32) -> Hello {
        let mut hello = Hello::new("greeter", HelloSpec { times });
        hello.metadata.namespace = Some("default".to_string());
        hello
    }

    fn pod_in_phase(phase: Option<&str>) -> Pod {
        Pod {
            status: Some(PodStatus {
                phase: phase.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_copies_identity() {
        let pod = build(&hello(5));
        assert_eq!(pod.metadata.name.as_deref(), Some("greeter"));
        assert_eq!(pod.metadata.namespace.as_deref(), Some("default"));
        assert!(pod.metadata.owner_references.is_none());
    }

    #[test]
    fn test_build_encodes_times_in_command() {
        let pod = build(&hello(5));
        let spec = pod.spec.unwrap();
        assert_eq!(spec.restart_policy.as_deref(), Some("OnFailure"));
        assert_eq!(spec.containers.len(), 1);

        let container = &spec.containers[0];
        assert_eq!(container.name, CONTAINER_NAME);
        assert_eq!(container.image.as_deref(), Some(IMAGE));
        assert_eq!(
            container.command.as_deref().unwrap(),
            [
                "/bin/sh".to_string(),
                "-c".to_string(),
                "seq 5 | xargs -I{} echo \"Hello\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(build(&hello(7)), build(&hello(7)));
        assert_ne!(build(&hello(7)), build(&hello(8)));
    }

    #[test]
    fn test_build_handles_zero_times() {
        let pod = build(&hello(0));
        let command = pod.spec.unwrap().containers[0].command.clone().unwrap();
        assert_eq!(command[2], "seq 0 | xargs -I{} echo \"Hello\"");
    }

    #[test]
    fn test_observe_maps_pod_phases() {
        assert_eq!(observe(&pod_in_phase(Some("Succeeded"))), WorkUnitState::Succeeded);
        assert_eq!(observe(&pod_in_phase(Some("Failed"))), WorkUnitState::Failed);
        assert_eq!(observe(&pod_in_phase(Some("Running"))), WorkUnitState::Running);
        assert_eq!(observe(&pod_in_phase(Some("Pending"))), WorkUnitState::Unknown);
        assert_eq!(observe(&pod_in_phase(None)), WorkUnitState::Unknown);
        assert_eq!(observe(&Pod::default()), WorkUnitState::Unknown);
    }
}
