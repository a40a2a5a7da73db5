//! Resource store and ownership seams used by the reconciler
//!
//! The reconciler never touches a `kube::Client` directly. It talks to a
//! [`ResourceStore`] and an [`OwnerLinker`] handed to it at construction, so
//! the same driver runs against the API server or against [`MemoryStore`].

mod kube_store;
mod memory;
mod owner;

pub use kube_store::KubeStore;
pub use memory::MemoryStore;
pub use owner::{ControllerOwnerLinker, OwnerLinker};

use std::fmt;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{Resource, ResourceExt};

use crate::crd::Hello;
use crate::error::{Error, Result};

/// Namespace and name of a namespaced object
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an existing object; both namespace and name must be set
    pub fn of<K: Resource>(obj: &K) -> Result<Self> {
        let namespace = obj.namespace().ok_or(Error::MissingObjectKey("namespace"))?;
        let name = obj
            .meta()
            .name
            .clone()
            .ok_or(Error::MissingObjectKey("name"))?;
        Ok(Self { namespace, name })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Get/create/delete/update-status over Hello and Pod resources.
///
/// Implementations report the outcomes the reconciler branches on as
/// dedicated errors: [`Error::AlreadyExists`] from `create_pod`,
/// [`Error::NotFound`] from `delete_pod` and `update_hello_status`, and
/// [`Error::Conflict`] from `update_hello_status` when the stored
/// `resourceVersion` no longer matches.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch a Hello; `None` if it does not exist
    async fn get_hello(&self, key: &ObjectKey) -> Result<Option<Hello>>;

    /// Fetch a Pod; `None` if it does not exist
    async fn get_pod(&self, key: &ObjectKey) -> Result<Option<Pod>>;

    /// Create a Pod
    async fn create_pod(&self, pod: &Pod) -> Result<()>;

    /// Delete a Pod
    async fn delete_pod(&self, key: &ObjectKey) -> Result<()>;

    /// Write the status of `hello`, guarded by its `resourceVersion`
    async fn update_hello_status(&self, hello: &Hello) -> Result<Hello>;
}
