// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pure unseal state machine.
//!
//! Every attempt re-derives the state of a pod from scratch, the unsealed
//! annotation being the only state that survives between attempts.

use crate::constants::requeue;
use crate::types::OpenBaoPod;
use k8s_openapi::api::core::v1::Pod;
use std::time::Duration;

/// What is known about a pod during one reconciliation attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub is_openbao: bool,
    pub is_unsealed: bool,
    pub is_ready: bool,
    pub container: Option<String>,
    /// The unseal command already succeeded during this attempt
    pub executed: bool,
}

impl Observation {
    pub fn of(pod: &Pod) -> Self {
        Self {
            is_openbao: pod.is_openbao(),
            is_unsealed: pod.is_unsealed(),
            is_ready: pod.is_ready(),
            container: pod.openbao_container(),
            executed: false,
        }
    }

    pub fn executed(self) -> Self {
        Self {
            executed: true,
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NotOpenBao,
    AlreadyUnsealed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailReason {
    NoContainer,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to do until the pod changes
    Skip(SkipReason),
    /// Look again later, not an error
    RequeueAfter(Duration),
    /// Run the unseal command in this container
    Unseal { container: String },
    /// Unsealed, persist the annotation
    MarkComplete,
    Fail(FailReason),
}

pub fn decide(observation: &Observation) -> Decision {
    if !observation.is_openbao {
        return Decision::Skip(SkipReason::NotOpenBao);
    }

    if observation.is_unsealed {
        return Decision::Skip(SkipReason::AlreadyUnsealed);
    }

    if !observation.is_ready {
        return Decision::RequeueAfter(Duration::from_secs(requeue::NOT_READY_SECS));
    }

    if observation.executed {
        return Decision::MarkComplete;
    }

    match &observation.container {
        Some(container) => Decision::Unseal {
            container: container.clone(),
        },
        None => Decision::Fail(FailReason::NoContainer),
    }
}
