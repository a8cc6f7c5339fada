// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes label identifying OpenBao pods
pub mod labels {
    pub const NAME: &str = "app.kubernetes.io/name";
    pub const NAME_VALUE: &str = "openbao";
}

/// Kubernetes annotation keys written by the unsealer
pub mod annotations {
    /// Present once a pod has been unsealed; the value is an RFC3339 timestamp
    pub const UNSEALED: &str = "openbao.io/unsealed";
}

/// Container names recognized as the OpenBao server container
pub const OPENBAO_CONTAINERS: [&str; 2] = ["openbao", "bao"];

/// Defaults for the secret holding the unseal key
pub mod secret {
    pub const DEFAULT_NAME: &str = "openbao-unseal-key";
    pub const DEFAULT_KEY: &str = "unseal-key";
}

/// Command run inside the OpenBao container, the unseal key is appended
pub const UNSEAL_COMMAND: [&str; 2] = ["bao", "unseal"];

/// Requeue intervals
pub mod requeue {
    /// Re-check interval for pods that are not Ready yet
    pub const NOT_READY_SECS: u64 = 10;
    /// Backoff after a failed unseal attempt
    pub const UNSEAL_FAILED_SECS: u64 = 30;
    /// Backoff for errors that carry no hint of their own
    pub const DEFAULT_ERROR_SECS: u64 = 5;
}

/// Defaults for the pod controller
pub mod controller {
    pub const DEFAULT_CONCURRENCY: u16 = 5;
    pub const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 60;
}
