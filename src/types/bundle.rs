// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ConfigBundle - the controller's view of an annotated ConfigMap

use crate::constants::annotations;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// A named, namespaced set of string payloads plus its annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigBundle {
    pub name: String,
    pub namespace: String,
    pub data: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

impl ConfigBundle {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// True when at least one `grafana.net/` annotation is present
    pub fn is_annotated(&self) -> bool {
        self.annotations
            .keys()
            .any(|k| k.starts_with(annotations::PREFIX))
    }

    /// Cache key used by the watcher
    pub fn key(&self) -> (String, String) {
        (self.namespace.clone(), self.name.clone())
    }

    /// Two bundles are equivalent when both their payloads and their annotations
    /// match key for key. Updates between equivalent bundles are echoes and are ignored.
    pub fn is_equivalent(&self, other: &ConfigBundle) -> bool {
        self.data == other.data && self.annotations == other.annotations
    }
}

impl From<&ConfigMap> for ConfigBundle {
    fn from(cm: &ConfigMap) -> Self {
        Self {
            name: cm.name_any(),
            namespace: cm.namespace().unwrap_or_default(),
            data: cm.data.clone().unwrap_or_default(),
            annotations: cm.annotations().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn make_bundle() -> ConfigBundle {
        ConfigBundle::new("dashboards", "team-a")
            .with_data("home.json", r#"{"title":"Home"}"#)
            .with_annotation("grafana.net/dashboard", "true")
    }

    #[test]
    fn test_equivalent_is_reflexive() {
        let bundle = make_bundle();
        assert!(bundle.is_equivalent(&bundle));
    }

    #[test]
    fn test_equivalent_is_symmetric() {
        let a = make_bundle();
        let b = make_bundle().with_data("other.json", "{}");

        assert_eq!(a.is_equivalent(&b), b.is_equivalent(&a));
        assert!(!a.is_equivalent(&b));
    }

    #[test]
    fn test_equivalent_detects_changed_value() {
        let a = make_bundle();
        let b = make_bundle().with_data("home.json", r#"{"title":"Home v2"}"#);

        assert!(!a.is_equivalent(&b));
    }

    #[test]
    fn test_equivalent_detects_changed_annotation() {
        let a = make_bundle();
        let b = make_bundle().with_annotation("grafana.net/folder", "true");

        assert!(!a.is_equivalent(&b));
        assert!(!b.is_equivalent(&a));
    }

    #[test]
    fn test_is_annotated() {
        assert!(make_bundle().is_annotated());
        assert!(ConfigBundle::new("cm", "ns")
            .with_annotation("grafana.net/id", "1")
            .is_annotated());
        assert!(!ConfigBundle::new("cm", "ns")
            .with_annotation("kubectl.kubernetes.io/last-applied-configuration", "{}")
            .is_annotated());
    }

    #[test]
    fn test_equivalent_ignores_name_and_namespace() {
        let a = make_bundle();
        let mut b = make_bundle();
        b.name = "renamed".to_string();
        b.namespace = "team-b".to_string();

        assert!(a.is_equivalent(&b));
    }

    #[test]
    fn test_from_configmap() {
        let cm = ConfigMap {
            metadata: ObjectMeta {
                name: Some("datasources".to_string()),
                namespace: Some("monitoring".to_string()),
                annotations: Some(BTreeMap::from([(
                    "grafana.net/datasource".to_string(),
                    "true".to_string(),
                )])),
                ..Default::default()
            },
            data: Some(BTreeMap::from([(
                "ds1".to_string(),
                r#"{"name":"Prometheus","type":"prometheus"}"#.to_string(),
            )])),
            ..Default::default()
        };

        let bundle = ConfigBundle::from(&cm);

        assert_eq!(bundle.name, "datasources");
        assert_eq!(bundle.namespace, "monitoring");
        assert_eq!(bundle.annotation("grafana.net/datasource"), Some("true"));
        assert_eq!(bundle.data.len(), 1);
    }

    #[test]
    fn test_from_configmap_without_data_or_annotations() {
        let cm = ConfigMap {
            metadata: ObjectMeta {
                name: Some("empty".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let bundle = ConfigBundle::from(&cm);

        assert!(bundle.data.is_empty());
        assert!(bundle.annotations.is_empty());
        assert_eq!(bundle.namespace, "");
    }
}
