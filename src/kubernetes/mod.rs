// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes-backed adapters for pod storage, unseal keys and remote exec.

pub mod exec;
pub mod pods;
pub mod secrets;

pub use exec::{ExecTarget, PodExecExecutor, UnsealExecutor};
pub use pods::{KubePodStore, PodStore};
pub use secrets::{CredentialSource, SecretCredentialSource, UnsealKey};
