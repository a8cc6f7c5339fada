// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Drives a single pod through the unseal state machine.

use crate::constants::annotations;
use crate::error::{Result, UnsealerError};
use crate::kubernetes::{CredentialSource, ExecTarget, PodStore, UnsealExecutor};
use crate::types::PodKey;
use crate::unseal::decision::{decide, Decision, FailReason, Observation, SkipReason};
use chrono::{SecondsFormat, Utc};
use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Result of a successful reconciliation attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The pod no longer exists
    Gone,
    Skipped(SkipReason),
    Requeued(Duration),
    Unsealed,
}

pub struct UnsealEngine {
    pods: Arc<dyn PodStore>,
    credentials: Arc<dyn CredentialSource>,
    executor: Arc<dyn UnsealExecutor>,
}

impl UnsealEngine {
    pub fn new(
        pods: Arc<dyn PodStore>,
        credentials: Arc<dyn CredentialSource>,
        executor: Arc<dyn UnsealExecutor>,
    ) -> Self {
        Self {
            pods,
            credentials,
            executor,
        }
    }

    /// Re-read the pod and take it as far as possible towards unsealed.
    ///
    /// The unsealed annotation is the only thing preventing a second unseal, so
    /// it is always checked against a fresh read, never against the event that
    /// triggered this attempt.
    #[instrument(skip(self, key), fields(pod = %key))]
    pub async fn reconcile(&self, key: &PodKey) -> Result<Outcome> {
        let pod = match self.pods.get(key).await {
            Ok(pod) => pod,
            Err(UnsealerError::NotFound(_)) => {
                debug!("Pod {} no longer exists", key);
                return Ok(Outcome::Gone);
            }
            Err(e) => {
                error!("Unable to fetch pod {}: {}", key, e);
                return Err(e);
            }
        };

        let mut observation = Observation::of(&pod);

        loop {
            match decide(&observation) {
                Decision::Skip(SkipReason::NotOpenBao) => {
                    debug!("Pod {} is not an OpenBao pod, skipping", key);
                    return Ok(Outcome::Skipped(SkipReason::NotOpenBao));
                }
                Decision::Skip(reason) => {
                    info!("Pod {} already unsealed, skipping", key);
                    return Ok(Outcome::Skipped(reason));
                }
                Decision::RequeueAfter(after) => {
                    info!("Pod {} not ready yet, requeuing in {:?}", key, after);
                    return Ok(Outcome::Requeued(after));
                }
                Decision::Fail(FailReason::NoContainer) => {
                    let e =
                        UnsealerError::NoContainer(format!("pod {} declares no containers", key));
                    error!("Failed to unseal pod {}: {}", key, e);
                    return Err(e);
                }
                Decision::Unseal { container } => {
                    if let Err(e) = self.unseal(key, container).await {
                        error!("Failed to unseal pod {}: {}", key, e);
                        return Err(e);
                    }
                    observation = observation.executed();
                }
                Decision::MarkComplete => {
                    if let Err(e) = self.mark_unsealed(&pod).await {
                        error!("Failed to mark pod {} as unsealed: {}", key, e);
                        return Err(e);
                    }
                    info!("Successfully unsealed OpenBao pod {}", key);
                    return Ok(Outcome::Unsealed);
                }
            }
        }
    }

    async fn unseal(&self, key: &PodKey, container: String) -> Result<()> {
        let unseal_key = self.credentials.fetch_unseal_key(&key.namespace).await?;

        let target = ExecTarget {
            namespace: key.namespace.clone(),
            pod: key.name.clone(),
            container,
        };

        self.executor.unseal(&target, &unseal_key).await
    }

    async fn mark_unsealed(&self, pod: &Pod) -> Result<()> {
        let mut pod = pod.clone();
        pod.metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert(annotations::UNSEALED.to_string(), unsealed_timestamp());

        self.pods.update(&pod).await.map(|_| ())
    }
}

fn unsealed_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
