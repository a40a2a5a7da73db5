//! Owner references from work unit Pods back to their Hello

use k8s_openapi::api::core::v1::Pod;
use kube::Resource;

use crate::crd::Hello;
use crate::error::{Error, Result};

/// Links a child Pod to the Hello that owns it
pub trait OwnerLinker: Send + Sync {
    fn set_owner(&self, child: &mut Pod, parent: &Hello) -> Result<()>;
}

/// Sets a controller owner reference, so the platform garbage collects the
/// Pod with its Hello and routes Pod events to the owning Hello.
#[derive(Clone, Copy, Debug, Default)]
pub struct ControllerOwnerLinker;

impl OwnerLinker for ControllerOwnerLinker {
    fn set_owner(&self, child: &mut Pod, parent: &Hello) -> Result<()> {
        if parent.meta().uid.is_none() {
            return Err(Error::MissingObjectKey("uid"));
        }
        let owner = parent
            .controller_owner_ref(&())
            .ok_or(Error::MissingObjectKey("name"))?;

        let refs = child.metadata.owner_references.get_or_insert_with(Vec::new);
        if let Some(other) = refs
            .iter()
            .find(|r| r.controller == Some(true) && r.uid != owner.uid)
        {
            return Err(Error::AlreadyOwned(format!(
                "pod controlled by {} {}",
                other.kind, other.name
            )));
        }
        refs.retain(|r| r.uid != owner.uid);
        refs.push(owner);
        Ok(())
    }
}
