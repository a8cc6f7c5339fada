// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pod reads and writes against the API server

use crate::error::{Result, UnsealerError};
use crate::types::PodKey;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{api::PostParams, Api, Client, ResourceExt};
use tracing::{debug, instrument};

/// Strongly consistent pod storage
#[async_trait]
pub trait PodStore: Send + Sync {
    /// Fetch the current state of a pod
    async fn get(&self, key: &PodKey) -> Result<Pod>;
    /// Replace a pod, failing with `Conflict` if it changed since it was read.
    /// Other failures, a 404 included, are plain API errors.
    async fn update(&self, pod: &Pod) -> Result<Pod>;
}

pub struct KubePodStore {
    client: Client,
}

impl KubePodStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PodStore for KubePodStore {
    #[instrument(skip(self, key), fields(pod = %key))]
    async fn get(&self, key: &PodKey) -> Result<Pod> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &key.namespace);

        match pods.get(&key.name).await {
            Ok(pod) => Ok(pod),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                Err(UnsealerError::NotFound(format!("pod {}", key)))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, pod), fields(pod = %PodKey::of(pod)))]
    async fn update(&self, pod: &Pod) -> Result<Pod> {
        let key = PodKey::of(pod);
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &key.namespace);

        // resourceVersion from the read is carried along, so a concurrent change yields 409
        match pods.replace(&pod.name_any(), &PostParams::default(), pod).await {
            Ok(updated) => {
                debug!(
                    "Pod {} updated to resource version {:?}",
                    key,
                    updated.resource_version()
                );
                Ok(updated)
            }
            Err(kube::Error::Api(err)) if err.code == 409 => Err(UnsealerError::Conflict(
                format!("pod {} was modified concurrently: {}", key, err.message),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{not_found_json, MockService};
    use crate::types::pod::fixtures::PodBuilder;

    const POD_PATH: &str = "/api/v1/namespaces/ns/pods/pod-a";

    fn pod_json(pod: &Pod) -> String {
        serde_json::to_string(pod).unwrap()
    }

    #[tokio::test]
    async fn test_get_pod() {
        let pod = PodBuilder::new("ns", "pod-a").openbao_label().build();
        let mock = MockService::new().on_get(POD_PATH, 200, &pod_json(&pod));
        let store = KubePodStore::new(mock.into_client());

        let fetched = store.get(&PodKey::new("ns", "pod-a")).await.unwrap();
        assert_eq!(fetched.name_any(), "pod-a");
    }

    #[tokio::test]
    async fn test_get_missing_pod_is_not_found() {
        let mock = MockService::new().on_get(POD_PATH, 404, &not_found_json("pods", "pod-a"));
        let store = KubePodStore::new(mock.into_client());

        let err = store.get(&PodKey::new("ns", "pod-a")).await.unwrap_err();
        assert!(matches!(err, UnsealerError::NotFound(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_update_sends_put_with_resource_version() {
        let pod = PodBuilder::new("ns", "pod-a")
            .annotation("openbao.io/unsealed", "2026-01-01T00:00:00+00:00")
            .build();
        let mock = MockService::new().on_put(POD_PATH, 200, &pod_json(&pod));
        let store = KubePodStore::new(mock.clone().into_client());

        store.update(&pod).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].path, POD_PATH);
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["metadata"]["resourceVersion"], "1");
        assert_eq!(
            body["metadata"]["annotations"]["openbao.io/unsealed"],
            "2026-01-01T00:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_update_conflict() {
        let conflict = serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": "the object has been modified",
            "reason": "Conflict",
            "code": 409
        })
        .to_string();
        let mock = MockService::new().on_put(POD_PATH, 409, &conflict);
        let store = KubePodStore::new(mock.into_client());

        let pod = PodBuilder::new("ns", "pod-a").build();
        let err = store.update(&pod).await.unwrap_err();
        assert!(matches!(err, UnsealerError::Conflict(_)), "{:?}", err);
        assert_eq!(err.requeue_after(), None);
    }

    #[tokio::test]
    async fn test_update_of_deleted_pod_uses_default_retry() {
        let mock = MockService::new().on_put(POD_PATH, 404, &not_found_json("pods", "pod-a"));
        let store = KubePodStore::new(mock.into_client());

        let pod = PodBuilder::new("ns", "pod-a").build();
        let err = store.update(&pod).await.unwrap_err();
        assert!(matches!(err, UnsealerError::KubeError(_)), "{:?}", err);
        assert_eq!(err.requeue_after(), None);
    }
}
