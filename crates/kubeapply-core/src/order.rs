//! Kind-based apply ordering
//!
//! Resources are applied in a fixed kind order (adapted from Helm's install
//! order): namespaces and policies first, then storage, identities and RBAC,
//! services, workloads, autoscalers, batch jobs, and finally ingress and API
//! aggregation. Kinds missing from the table share a single rank after every
//! known kind. Ties are broken by namespace, then name.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::manifest::Manifest;

/// Default installation order
pub const DEFAULT_KIND_ORDER: &[&str] = &[
    "Namespace",
    "NetworkPolicy",
    "ResourceQuota",
    "LimitRange",
    "PodSecurityPolicy",
    "PodDisruptionBudget",
    "Secret",
    "ConfigMap",
    "ConfigMapList",
    "StorageClass",
    "PersistentVolume",
    "PersistentVolumeClaim",
    "ServiceAccount",
    "CustomResourceDefinition",
    "ClusterRole",
    "ClusterRoleList",
    "ClusterRoleBinding",
    "ClusterRoleBindingList",
    "Role",
    "RoleList",
    "RoleBinding",
    "RoleBindingList",
    "Service",
    "DaemonSet",
    "Pod",
    "ReplicationController",
    "ReplicaSet",
    "Deployment",
    "HorizontalPodAutoscaler",
    "StatefulSet",
    "Job",
    "CronJob",
    "Ingress",
    "APIService",
];

/// Immutable kind priority table
#[derive(Debug, Clone)]
pub struct KindPriority {
    kinds: Vec<String>,
    ranks: HashMap<String, usize>,
}

impl KindPriority {
    /// Build a table from kinds in priority order
    ///
    /// A kind listed twice keeps its first position.
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut ranks = HashMap::new();

        for kind in kinds {
            let kind = kind.into();
            if !ranks.contains_key(&kind) {
                ranks.insert(kind.clone(), ordered.len());
                ordered.push(kind);
            }
        }

        Self {
            kinds: ordered,
            ranks,
        }
    }

    /// Kinds in priority order
    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    /// Rank of a kind; unknown and empty kinds rank after every known kind
    pub fn rank(&self, kind: &str) -> usize {
        self.ranks.get(kind).copied().unwrap_or(self.kinds.len())
    }

    /// Compare two manifests by (kind rank, namespace, name)
    pub fn compare(&self, a: &Manifest, b: &Manifest) -> Ordering {
        self.rank(&a.kind)
            .cmp(&self.rank(&b.kind))
            .then_with(|| a.namespace.cmp(&b.namespace))
            .then_with(|| a.name.cmp(&b.name))
    }

    /// Stable sort into apply order
    pub fn sort(&self, manifests: &mut [Manifest]) {
        manifests.sort_by(|a, b| self.compare(a, b));
    }
}

impl Default for KindPriority {
    fn default() -> Self {
        Self::new(DEFAULT_KIND_ORDER.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn manifest(kind: &str, namespace: &str, name: &str) -> Manifest {
        let doc = format!(
            "apiVersion: v1\nkind: Placeholder\nmetadata:\n  name: {}\n  namespace: \"{}\"\n",
            name, namespace
        );
        let mut m = Manifest::parse(Path::new("test.yaml"), &doc).unwrap();
        // Set directly so empty kinds can be tested too
        m.kind = kind.to_string();
        m
    }

    fn keys(manifests: &[Manifest]) -> Vec<(String, String, String)> {
        manifests
            .iter()
            .map(|m| (m.kind.clone(), m.namespace.clone(), m.name.clone()))
            .collect()
    }

    #[test]
    fn test_rank() {
        let priority = KindPriority::default();
        assert_eq!(priority.rank("Namespace"), 0);
        assert_eq!(priority.rank("APIService"), DEFAULT_KIND_ORDER.len() - 1);
        assert_eq!(priority.rank("Widget"), DEFAULT_KIND_ORDER.len());
        assert_eq!(priority.rank(""), DEFAULT_KIND_ORDER.len());
    }

    #[test]
    fn test_known_kinds_dominate_name_and_namespace() {
        let priority = KindPriority::default();
        let mut manifests = vec![
            manifest("Deployment", "aaa", "aaa"),
            manifest("Service", "zzz", "zzz"),
            manifest("Namespace", "", "zzz"),
            manifest("ConfigMap", "zzz", "a"),
        ];
        priority.sort(&mut manifests);

        let kinds: Vec<_> = manifests.iter().map(|m| m.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Namespace", "ConfigMap", "Service", "Deployment"]);
    }

    #[test]
    fn test_unknown_kinds_tie_break_by_namespace_then_name() {
        let priority = KindPriority::default();
        let mut manifests = vec![
            manifest("Foo", "ns", "zeta"),
            manifest("Bar", "ns", "alpha"),
            manifest("Baz", "a-ns", "omega"),
            manifest("", "ns", "beta"),
            manifest("Job", "zz", "zz"),
        ];
        priority.sort(&mut manifests);

        assert_eq!(
            keys(&manifests),
            vec![
                ("Job".into(), "zz".into(), "zz".into()),
                ("Baz".into(), "a-ns".into(), "omega".into()),
                ("Bar".into(), "ns".into(), "alpha".into()),
                ("".into(), "ns".into(), "beta".into()),
                ("Foo".into(), "ns".into(), "zeta".into()),
            ]
        );
    }

    #[test]
    fn test_sort_is_idempotent() {
        let priority = KindPriority::default();
        let mut manifests = vec![
            manifest("StatefulSet", "db", "pg"),
            manifest("Secret", "db", "creds"),
            manifest("CustomThing", "", "x"),
            manifest("Namespace", "", "db"),
            manifest("Secret", "app", "creds"),
        ];
        priority.sort(&mut manifests);
        let once = keys(&manifests);
        priority.sort(&mut manifests);
        assert_eq!(keys(&manifests), once);
    }

    #[test]
    fn test_custom_table() {
        let priority = KindPriority::new(["Deployment", "Namespace", "Deployment"]);
        assert_eq!(priority.kinds().len(), 2);
        assert_eq!(priority.rank("Deployment"), 0);
        assert_eq!(priority.rank("Namespace"), 1);

        let mut manifests = vec![manifest("Namespace", "", "a"), manifest("Deployment", "a", "b")];
        priority.sort(&mut manifests);
        assert_eq!(manifests[0].kind, "Deployment");
    }
}
