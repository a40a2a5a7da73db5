//! [`ResourceStore`] backed by the Kubernetes API server

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{DeleteParams, PostParams},
    Api, Client,
};
use tracing::debug;

use super::{ObjectKey, ResourceStore};
use crate::crd::Hello;
use crate::error::{Error, Result};

/// Kubernetes-backed store
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn hellos(&self, namespace: &str) -> Api<Hello> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Turn API status codes the reconciler cares about into dedicated errors
fn classify(err: kube::Error, what: String) -> Error {
    match err {
        kube::Error::Api(ae) if ae.code == 404 => Error::NotFound(what),
        kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists" => {
            Error::AlreadyExists(what)
        }
        kube::Error::Api(ae) if ae.code == 409 => Error::Conflict(what),
        other => Error::Kube(other),
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get_hello(&self, key: &ObjectKey) -> Result<Option<Hello>> {
        Ok(self.hellos(&key.namespace).get_opt(&key.name).await?)
    }

    async fn get_pod(&self, key: &ObjectKey) -> Result<Option<Pod>> {
        Ok(self.pods(&key.namespace).get_opt(&key.name).await?)
    }

    async fn create_pod(&self, pod: &Pod) -> Result<()> {
        let key = ObjectKey::of(pod)?;
        self.pods(&key.namespace)
            .create(&PostParams::default(), pod)
            .await
            .map_err(|e| classify(e, format!("pod {}", key)))?;
        debug!(pod = %key, "Created pod");
        Ok(())
    }

    async fn delete_pod(&self, key: &ObjectKey) -> Result<()> {
        self.pods(&key.namespace)
            .delete(&key.name, &DeleteParams::background())
            .await
            .map_err(|e| classify(e, format!("pod {}", key)))?;
        debug!(pod = %key, "Deleted pod");
        Ok(())
    }

    async fn update_hello_status(&self, hello: &Hello) -> Result<Hello> {
        let key = ObjectKey::of(hello)?;
        // replace (not patch) so the API server checks resourceVersion
        let body = serde_json::to_vec(hello)?;
        self.hellos(&key.namespace)
            .replace_status(&key.name, &PostParams::default(), body)
            .await
            .map_err(|e| classify(e, format!("hello {}", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "test".to_string(),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_classify_not_found() {
        let err = classify(api_error(404, "NotFound"), "pod a/b".to_string());
        assert!(matches!(err, Error::NotFound(ref w) if w == "pod a/b"));
    }

    #[test]
    fn test_classify_already_exists_vs_conflict() {
        let err = classify(api_error(409, "AlreadyExists"), "pod a/b".to_string());
        assert!(matches!(err, Error::AlreadyExists(_)));

        let err = classify(api_error(409, "Conflict"), "hello a/b".to_string());
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_classify_passes_through_other_errors() {
        let err = classify(api_error(500, "InternalError"), "pod a/b".to_string());
        assert!(matches!(err, Error::Kube(_)));
    }
}
