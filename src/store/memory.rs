//! In-memory [`ResourceStore`]
//!
//! Mirrors the API server behaviour the reconciler depends on: objects are
//! keyed by namespace/name, every write bumps `resourceVersion`, status
//! writes with a stale version are rejected, and creating an existing Pod
//! reports [`Error::AlreadyExists`]. Owner-reference garbage collection is
//! modelled by [`MemoryStore::delete_hello`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, PodStatus};
use tokio::sync::Mutex;

use super::{ObjectKey, ResourceStore};
use crate::crd::{Hello, HelloStatus};
use crate::error::{Error, Result};

#[derive(Default)]
struct Objects {
    hellos: BTreeMap<ObjectKey, Hello>,
    pods: BTreeMap<ObjectKey, Pod>,
    version: u64,
    uid: u64,
}

impl Objects {
    fn next_version(&mut self) -> String {
        self.version += 1;
        self.version.to_string()
    }

    fn next_uid(&mut self) -> String {
        self.uid += 1;
        format!("uid-{}", self.uid)
    }
}

/// In-memory store with API-server-like versioning
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<Objects>,
    pod_creates: AtomicUsize,
    pod_deletes: AtomicUsize,
    status_updates: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a Hello, assigning uid and resourceVersion
    pub async fn insert_hello(&self, mut hello: Hello) -> Result<ObjectKey> {
        let key = ObjectKey::of(&hello)?;
        let mut objects = self.objects.lock().await;
        if hello.metadata.uid.is_none() {
            hello.metadata.uid = Some(objects.next_uid());
        }
        hello.metadata.resource_version = Some(objects.next_version());
        objects.hellos.insert(key.clone(), hello);
        Ok(key)
    }

    /// Overwrite the stored phase as another writer would, bumping the version
    pub async fn set_hello_phase(&self, key: &ObjectKey, phase: Option<&str>) -> Result<()> {
        let mut objects = self.objects.lock().await;
        let version = objects.next_version();
        let hello = objects
            .hellos
            .get_mut(key)
            .ok_or_else(|| Error::NotFound(format!("hello {}", key)))?;
        hello.status = Some(HelloStatus {
            phase: phase.map(str::to_string),
        });
        hello.metadata.resource_version = Some(version);
        Ok(())
    }

    /// Delete a Hello and, like owner-reference GC, the Pods it controls
    pub async fn delete_hello(&self, key: &ObjectKey) -> Option<Hello> {
        let mut objects = self.objects.lock().await;
        let hello = objects.hellos.remove(key)?;
        let uid = hello.metadata.uid.clone();
        objects.pods.retain(|_, pod| {
            !pod.metadata
                .owner_references
                .iter()
                .flatten()
                .any(|owner| Some(&owner.uid) == uid.as_ref())
        });
        Some(hello)
    }

    /// Record the Pod phase the kubelet would report
    pub async fn set_pod_phase(&self, key: &ObjectKey, phase: &str) -> Result<()> {
        let mut objects = self.objects.lock().await;
        let version = objects.next_version();
        let pod = objects
            .pods
            .get_mut(key)
            .ok_or_else(|| Error::NotFound(format!("pod {}", key)))?;
        pod.status = Some(PodStatus {
            phase: Some(phase.to_string()),
            ..Default::default()
        });
        pod.metadata.resource_version = Some(version);
        Ok(())
    }

    /// Current stored Hello
    pub async fn hello(&self, key: &ObjectKey) -> Option<Hello> {
        self.objects.lock().await.hellos.get(key).cloned()
    }

    /// Current stored Pod
    pub async fn pod(&self, key: &ObjectKey) -> Option<Pod> {
        self.objects.lock().await.pods.get(key).cloned()
    }

    /// Number of Pods currently stored
    pub async fn pod_count(&self) -> usize {
        self.objects.lock().await.pods.len()
    }

    /// Pod creations that reached the store, including rejected ones
    pub fn pod_creates(&self) -> usize {
        self.pod_creates.load(Ordering::SeqCst)
    }

    /// Pod deletions that reached the store, including not-found ones
    pub fn pod_deletes(&self) -> usize {
        self.pod_deletes.load(Ordering::SeqCst)
    }

    /// Successful status writes
    pub fn status_updates(&self) -> usize {
        self.status_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get_hello(&self, key: &ObjectKey) -> Result<Option<Hello>> {
        Ok(self.hello(key).await)
    }

    async fn get_pod(&self, key: &ObjectKey) -> Result<Option<Pod>> {
        Ok(self.pod(key).await)
    }

    async fn create_pod(&self, pod: &Pod) -> Result<()> {
        self.pod_creates.fetch_add(1, Ordering::SeqCst);
        let key = ObjectKey::of(pod)?;
        let mut objects = self.objects.lock().await;
        if objects.pods.contains_key(&key) {
            return Err(Error::AlreadyExists(format!("pod {}", key)));
        }
        let mut pod = pod.clone();
        pod.metadata.uid = Some(objects.next_uid());
        pod.metadata.resource_version = Some(objects.next_version());
        objects.pods.insert(key, pod);
        Ok(())
    }

    async fn delete_pod(&self, key: &ObjectKey) -> Result<()> {
        self.pod_deletes.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.lock().await;
        objects
            .pods
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("pod {}", key)))
    }

    async fn update_hello_status(&self, hello: &Hello) -> Result<Hello> {
        let key = ObjectKey::of(hello)?;
        let mut objects = self.objects.lock().await;
        let stored_version = objects
            .hellos
            .get(&key)
            .ok_or_else(|| Error::NotFound(format!("hello {}", key)))?
            .metadata
            .resource_version
            .clone();
        if stored_version != hello.metadata.resource_version {
            return Err(Error::Conflict(format!("hello {}", key)));
        }

        let version = objects.next_version();
        let stored = objects
            .hellos
            .get_mut(&key)
            .ok_or_else(|| Error::NotFound(format!("hello {}", key)))?;
        // status subresource: only status and version change
        stored.status = hello.status.clone();
        stored.metadata.resource_version = Some(version);
        self.status_updates.fetch_add(1, Ordering::SeqCst);
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::HelloSpec;

    fn hello(name: &str) -> Hello {
        let mut hello = Hello::new(name, HelloSpec { times: 2 });
        hello.metadata.namespace = Some("default".to_string());
        hello
    }

    #[tokio::test]
    async fn test_status_update_rejects_stale_version() {
        let store = MemoryStore::new();
        let key = store.insert_hello(hello("a")).await.unwrap();

        let mut fetched = store.get_hello(&key).await.unwrap().unwrap();
        store.set_hello_phase(&key, Some("Running")).await.unwrap();

        fetched.status = Some(HelloStatus {
            phase: Some("Failed".to_string()),
        });
        let err = store.update_hello_status(&fetched).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(
            store.hello(&key).await.unwrap().phase_str(),
            Some("Running")
        );
        assert_eq!(store.status_updates(), 0);
    }

    #[tokio::test]
    async fn test_status_update_ignores_spec_changes() {
        let store = MemoryStore::new();
        let key = store.insert_hello(hello("a")).await.unwrap();

        let mut fetched = store.get_hello(&key).await.unwrap().unwrap();
        fetched.spec.times = 99;
        fetched.status = Some(HelloStatus {
            phase: Some("Running".to_string()),
        });
        let updated = store.update_hello_status(&fetched).await.unwrap();

        assert_eq!(updated.spec.times, 2);
        assert_eq!(updated.phase_str(), Some("Running"));
        assert_ne!(
            updated.metadata.resource_version,
            fetched.metadata.resource_version
        );
    }

    #[tokio::test]
    async fn test_create_and_delete_pod_report_distinguishable_errors() {
        let store = MemoryStore::new();
        let mut pod = Pod::default();
        pod.metadata.name = Some("a".to_string());
        pod.metadata.namespace = Some("default".to_string());
        let key = ObjectKey::new("default", "a");

        store.create_pod(&pod).await.unwrap();
        let err = store.create_pod(&pod).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        store.delete_pod(&key).await.unwrap();
        let err = store.delete_pod(&key).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(store.pod_creates(), 2);
        assert_eq!(store.pod_deletes(), 2);
    }
}
