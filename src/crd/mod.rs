//! Custom Resource Definitions for the Hello Operator

mod hello;

pub use hello::*;

use kube::CustomResourceExt;

/// Generate all CRD YAML manifests
pub fn generate_crds() -> Result<Vec<String>, serde_yaml::Error> {
    Ok(vec![serde_yaml::to_string(&Hello::crd())?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_crd_names_hello_kind() {
        let crds = generate_crds().unwrap();
        assert_eq!(crds.len(), 1);
        assert!(crds[0].contains("kind: Hello"));
        assert!(crds[0].contains("hellos.myapp.freelizhun.com"));
        assert!(crds[0].contains("status: {}"));
    }
}
