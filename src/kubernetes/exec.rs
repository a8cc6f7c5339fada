// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Running the unseal command inside an OpenBao container

use crate::constants::UNSEAL_COMMAND;
use crate::error::{Result, UnsealerError};
use crate::kubernetes::secrets::UnsealKey;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::{api::AttachParams, Api, Client};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{info, instrument, warn};

/// Container an unseal command is run in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecTarget {
    pub namespace: String,
    pub pod: String,
    pub container: String,
}

impl fmt::Display for ExecTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.namespace, self.pod, self.container)
    }
}

/// Runs the unseal command. Not idempotent: every successful call unseals once.
#[async_trait]
pub trait UnsealExecutor: Send + Sync {
    async fn unseal(&self, target: &ExecTarget, key: &UnsealKey) -> Result<()>;
}

/// Argument vector for unsealing with the given key
pub fn unseal_command(key: &UnsealKey) -> Vec<String> {
    UNSEAL_COMMAND
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(key.expose().to_string()))
        .collect()
}

/// Executor using the pod `exec` subresource
pub struct PodExecExecutor {
    client: Client,
    timeout: Duration,
}

impl PodExecExecutor {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn run(&self, target: &ExecTarget, command: Vec<String>) -> Result<()> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &target.namespace);
        let params = AttachParams::default()
            .container(target.container.clone())
            .stdin(false)
            .stdout(true)
            .stderr(true);

        let mut attached = within(self.timeout, pods.exec(&target.pod, command, &params))
            .await?
            .map_err(|e| {
                UnsealerError::ExecFailure(format!("failed to open exec stream: {}", e))
            })?;

        let stdout = attached.stdout();
        let stderr = attached.stderr();
        let status = attached.take_status();

        let drained = async move {
            let (_, _, status) = tokio::join!(
                forward_lines(stdout, Stream::Stdout),
                forward_lines(stderr, Stream::Stderr),
                async move {
                    match status {
                        Some(status) => status.await,
                        None => None,
                    }
                }
            );
            status
        };

        let status = match within(self.timeout, drained).await {
            Ok(status) => status,
            Err(e) => {
                // The message loop is a spawned task, dropping the session would leave it running
                attached.abort();
                return Err(e);
            }
        };

        attached
            .join()
            .await
            .map_err(|e| UnsealerError::ExecFailure(format!("exec stream failed: {}", e)))?;

        check_status(status)
    }
}

#[async_trait]
impl UnsealExecutor for PodExecExecutor {
    #[instrument(skip(self, key), fields(target = %target))]
    async fn unseal(&self, target: &ExecTarget, key: &UnsealKey) -> Result<()> {
        info!("Executing unseal command");
        self.run(target, unseal_command(key)).await
    }
}

/// Await `fut` for at most `timeout`
async fn within<T>(timeout: Duration, fut: impl Future<Output = T>) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| UnsealerError::ExecTimeout(timeout))
}

#[derive(Clone, Copy, Debug)]
enum Stream {
    Stdout,
    Stderr,
}

/// Copy remote output into the operator log, line by line. Returns the number of lines.
async fn forward_lines<R: AsyncRead + Unpin>(reader: Option<R>, stream: Stream) -> usize {
    let Some(reader) = reader else {
        return 0;
    };

    let mut lines = BufReader::new(reader).lines();
    let mut count = 0;
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                count += 1;
                match stream {
                    Stream::Stdout => info!(stream = "stdout", "{}", line),
                    Stream::Stderr => warn!(stream = "stderr", "{}", line),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read {:?}: {}", stream, e);
                break;
            }
        }
    }
    count
}

/// Map the terminal status of an exec session to a result
fn check_status(status: Option<Status>) -> Result<()> {
    let Some(status) = status else {
        return Err(UnsealerError::ExecFailure(
            "exec stream closed without a status".to_string(),
        ));
    };

    if status.status.as_deref() == Some("Success") {
        return Ok(());
    }

    Err(UnsealerError::ExecFailure(format!(
        "unseal command failed: {} ({})",
        status.message.unwrap_or_default(),
        status.reason.unwrap_or_default()
    )))
}
