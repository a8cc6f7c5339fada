// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::requeue;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnsealerError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Exec failed: {0}")]
    ExecFailure(String),

    #[error("Exec timed out after {0:?}")]
    ExecTimeout(Duration),

    #[error("No container to exec into: {0}")]
    NoContainer(String),

    #[error("Invalid unseal key: {0}")]
    InvalidCredential(String),
}

impl UnsealerError {
    /// Retry interval specific to this error, `None` leaves it to the default policy.
    pub fn requeue_after(&self) -> Option<Duration> {
        match self {
            UnsealerError::NotFound(_)
            | UnsealerError::ExecFailure(_)
            | UnsealerError::ExecTimeout(_)
            | UnsealerError::NoContainer(_)
            | UnsealerError::InvalidCredential(_) => {
                Some(Duration::from_secs(requeue::UNSEAL_FAILED_SECS))
            }
            UnsealerError::Conflict(_) | UnsealerError::KubeError(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, UnsealerError>;
