// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pod reconciler - watches pods and unseals OpenBao instances once they are ready.

use crate::config::Config;
use crate::error::{Result, UnsealerError};
use crate::kubernetes::{KubePodStore, PodExecExecutor, SecretCredentialSource};
use crate::reconcilers::filter::EventClassifier;
use crate::types::PodKey;
use crate::unseal::{Outcome, UnsealEngine};
use futures::{future, StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::{
    runtime::{
        controller::{self, Action},
        reflector, watcher, Controller, WatchStreamExt,
    },
    Api, Client,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct UnsealReconciler {
    client: Client,
    config: Config,
    engine: UnsealEngine,
}

impl UnsealReconciler {
    pub fn new(client: Client, config: Config) -> Self {
        let engine = UnsealEngine::new(
            Arc::new(KubePodStore::new(client.clone())),
            Arc::new(SecretCredentialSource::new(client.clone(), &config)),
            Arc::new(PodExecExecutor::new(client.clone(), config.exec_timeout)),
        );

        Self {
            client,
            config,
            engine,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let pods: Api<Pod> = match &self.config.watch_namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        };
        let controller_config =
            controller::Config::default().concurrency(self.config.max_concurrent_reconciles);

        info!(
            "Watching pods in {} with up to {} concurrent reconciliations",
            self.config.watch_namespace.as_deref().unwrap_or("all namespaces"),
            self.config.max_concurrent_reconciles
        );

        let (reader, writer) = reflector::store();
        let mut classifier = EventClassifier::default();
        let triggers = watcher(pods, WatcherConfig::default())
            .default_backoff()
            .reflect(writer)
            .try_filter_map(move |event| future::ready(Ok(classifier.admit(event))));

        let context = Arc::new(self);

        Controller::for_stream(triggers, reader)
            .with_config(controller_config)
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled pod: {:?}", o),
                    // Already logged by the engine and error_policy
                    Err(e) => debug!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        info!("Pod controller stopped");
        Ok(())
    }
}

async fn reconcile(pod: Arc<Pod>, ctx: Arc<UnsealReconciler>) -> Result<Action> {
    let key = PodKey::of(&pod);
    let outcome = ctx.engine.reconcile(&key).await?;
    Ok(action_for(&outcome))
}

fn action_for(outcome: &Outcome) -> Action {
    match outcome {
        Outcome::Requeued(after) => Action::requeue(*after),
        Outcome::Gone | Outcome::Skipped(_) | Outcome::Unsealed => Action::await_change(),
    }
}

fn retry_after(error: &UnsealerError, default: Duration) -> Duration {
    error.requeue_after().unwrap_or(default)
}

fn error_policy(pod: Arc<Pod>, error: &UnsealerError, ctx: Arc<UnsealReconciler>) -> Action {
    let after = retry_after(error, ctx.config.error_requeue);
    warn!(
        "Reconciliation of pod {} failed, retrying in {:?}: {}",
        PodKey::of(&pod),
        after,
        error
    );
    Action::requeue(after)
}
