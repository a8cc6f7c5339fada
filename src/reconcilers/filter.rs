// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Coarse event filter applied before pods are queued for reconciliation.
//!
//! Only an optimization: the engine re-checks everything on a fresh read.

use crate::types::{OpenBaoPod, PodKey};
use k8s_openapi::api::core::v1::Pod;
use kube_runtime::watcher::Event;
use std::collections::HashSet;

#[derive(Clone, Debug)]
pub enum PodEvent {
    Created(Pod),
    Updated(Pod),
    Deleted(Pod),
}

impl PodEvent {
    pub fn into_pod(self) -> Pod {
        match self {
            PodEvent::Created(pod) | PodEvent::Updated(pod) | PodEvent::Deleted(pod) => pod,
        }
    }
}

/// Whether an event may trigger a reconciliation
pub fn admits(event: &PodEvent) -> bool {
    match event {
        PodEvent::Created(pod) => pod.is_openbao(),
        PodEvent::Updated(pod) => pod.is_openbao() && !pod.is_unsealed(),
        PodEvent::Deleted(_) => false,
    }
}

/// Turns watcher events into create/update/delete events by remembering the pods it has seen
#[derive(Default)]
pub struct EventClassifier {
    known: HashSet<PodKey>,
    relist: Option<HashSet<PodKey>>,
}

impl EventClassifier {
    pub fn classify(&mut self, event: Event<Pod>) -> Option<PodEvent> {
        match event {
            Event::Init => {
                self.relist = Some(HashSet::new());
                None
            }
            Event::InitApply(pod) => {
                let key = PodKey::of(&pod);
                if let Some(relist) = self.relist.as_mut() {
                    relist.insert(key.clone());
                }
                Some(self.applied(key, pod))
            }
            Event::InitDone => {
                // Pods deleted while the watch was down never produce a Delete
                if let Some(relist) = self.relist.take() {
                    self.known = relist;
                }
                None
            }
            Event::Apply(pod) => {
                let key = PodKey::of(&pod);
                Some(self.applied(key, pod))
            }
            Event::Delete(pod) => {
                self.known.remove(&PodKey::of(&pod));
                Some(PodEvent::Deleted(pod))
            }
        }
    }

    /// Classify and filter in one step, yielding the pod to enqueue
    pub fn admit(&mut self, event: Event<Pod>) -> Option<Pod> {
        self.classify(event)
            .filter(admits)
            .map(PodEvent::into_pod)
    }

    fn applied(&mut self, key: PodKey, pod: Pod) -> PodEvent {
        if self.known.insert(key) {
            PodEvent::Created(pod)
        } else {
            PodEvent::Updated(pod)
        }
    }
}
