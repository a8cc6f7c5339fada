// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{annotations, labels, OPENBAO_CONTAINERS};
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::fmt;

/// Identity of a pod to reconcile
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PodKey {
    pub namespace: String,
    pub name: String,
}

impl PodKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn of(pod: &Pod) -> Self {
        Self::new(pod.namespace().unwrap_or_default(), pod.name_any())
    }
}

impl fmt::Display for PodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// OpenBao specific views on a pod
pub trait OpenBaoPod {
    /// Labelled as OpenBao, or running a container with a recognized OpenBao name
    fn is_openbao(&self) -> bool;
    /// Carries the unsealed annotation, whatever its value
    fn is_unsealed(&self) -> bool;
    /// Has a Ready=True condition
    fn is_ready(&self) -> bool;
    /// Container to run the unseal command in
    fn openbao_container(&self) -> Option<String>;
}

fn is_openbao_container(name: &str) -> bool {
    OPENBAO_CONTAINERS.contains(&name)
}

impl OpenBaoPod for Pod {
    fn is_openbao(&self) -> bool {
        let labelled = self
            .labels()
            .get(labels::NAME)
            .is_some_and(|v| v == labels::NAME_VALUE);

        labelled || containers(self).iter().any(|c| is_openbao_container(&c.name))
    }

    fn is_unsealed(&self) -> bool {
        self.annotations().contains_key(annotations::UNSEALED)
    }

    fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == "Ready" && c.status == "True")
            })
    }

    fn openbao_container(&self) -> Option<String> {
        let containers = containers(self);
        containers
            .iter()
            .find(|c| is_openbao_container(&c.name))
            .or_else(|| containers.first())
            .map(|c| c.name.clone())
    }
}

fn containers(pod: &Pod) -> &[k8s_openapi::api::core::v1::Container] {
    pod.spec
        .as_ref()
        .map(|s| s.containers.as_slice())
        .unwrap_or_default()
}
