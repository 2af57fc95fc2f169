//! Canonical resource identifiers
//!
//! A resource is identified by `<apiVersion>.<kind>.<namespace>.<name>`, with
//! an empty namespace field for cluster-scoped resources
//! (`rbac.authorization.k8s.io/v1.ClusterRole..admin`).
//!
//! Decoding is ambiguous in general because group names contain dots. The
//! apiVersion therefore ends at the first `.` after the first `/` when a
//! slash is present, and at the first `.` otherwise. The remainder is split
//! into at most three fields so that names may contain dots.

use std::fmt;

/// Decoded components of a resource identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Encode the identifier string
    pub fn encode(&self) -> String {
        Self::encode_parts(&self.api_version, &self.kind, &self.namespace, &self.name)
    }

    /// Encode an identifier from its parts without building a `ResourceId`
    pub fn encode_parts(api_version: &str, kind: &str, namespace: &str, name: &str) -> String {
        format!("{}.{}.{}.{}", api_version, kind, namespace, name)
    }

    /// Decode an identifier string
    ///
    /// Malformed identifiers decode to the empty `ResourceId` rather than an
    /// error; callers check [`ResourceId::is_empty`] and decide whether that
    /// is worth a warning.
    pub fn decode(id: &str) -> Self {
        let api_end = match id.find('/') {
            Some(slash) if slash > 0 => id[slash..].find('.').map(|dot| dot + slash),
            _ => id.find('.'),
        };

        let Some(api_end) = api_end else {
            return Self::default();
        };

        let mut fields = id[api_end + 1..].splitn(3, '.');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(kind), Some(namespace), Some(name)) => Self {
                api_version: id[..api_end].to_string(),
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            _ => Self::default(),
        }
    }

    /// Whether this is the zero value produced by a failed decode
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the resource is cluster-scoped (no namespace)
    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace.is_empty()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.api_version, self.kind, self.namespace, self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_grouped_api_version() {
        assert_eq!(
            ResourceId::decode("apps/v1.Deployment.ns1.myapp"),
            ResourceId::new("apps/v1", "Deployment", "ns1", "myapp")
        );
    }

    #[test]
    fn test_decode_dotted_group_and_name() {
        assert_eq!(
            ResourceId::decode(
                "apiextensions.k8s.io/v1.CustomResourceDefinition..analysisruns.argoproj.io"
            ),
            ResourceId::new(
                "apiextensions.k8s.io/v1",
                "CustomResourceDefinition",
                "",
                "analysisruns.argoproj.io"
            )
        );
    }

    #[test]
    fn test_decode_core_api_version() {
        assert_eq!(
            ResourceId::decode("v1.Service.argo-rollouts.argo-rollouts-metrics"),
            ResourceId::new("v1", "Service", "argo-rollouts", "argo-rollouts-metrics")
        );
    }

    #[test]
    fn test_decode_malformed() {
        assert_eq!(
            ResourceId::decode("v1.Service.onlytwo"),
            ResourceId::default()
        );
        assert!(ResourceId::decode("v1.Service.onlytwo").is_empty());
        assert!(ResourceId::decode("bad id").is_empty());
        assert!(ResourceId::decode("").is_empty());
        assert!(ResourceId::decode("apps/v1").is_empty());
    }

    #[test]
    fn test_round_trip() {
        let ids = [
            ResourceId::new("v1", "ConfigMap", "default", "settings"),
            ResourceId::new("apps/v1", "Deployment", "web", "frontend"),
            ResourceId::new("rbac.authorization.k8s.io/v1", "ClusterRole", "", "view"),
            ResourceId::new("networking.k8s.io/v1", "Ingress", "edge", "api.example.com"),
            ResourceId::new("v1", "Namespace", "", "monitoring"),
        ];

        for id in ids {
            assert_eq!(ResourceId::decode(&id.encode()), id);
        }
    }

    #[test]
    fn test_encode_empty_namespace() {
        assert_eq!(
            ResourceId::encode_parts("v1", "Namespace", "", "monitoring"),
            "v1.Namespace..monitoring"
        );
        let id = ResourceId::new("v1", "Namespace", "", "monitoring");
        assert_eq!(id.to_string(), id.encode());
        assert!(id.is_cluster_scoped());
    }
}
