// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Unseal key retrieval from Kubernetes secrets

use crate::config::Config;
use crate::error::{Result, UnsealerError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::fmt;
use tracing::{debug, instrument};

/// An unseal key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct UnsealKey(String);

impl UnsealKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UnsealKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UnsealKey(<redacted>)")
    }
}

/// Source of the unseal key for a namespace
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn fetch_unseal_key(&self, namespace: &str) -> Result<UnsealKey>;
}

/// Reads the unseal key from a fixed secret and field in the pod's namespace
pub struct SecretCredentialSource {
    client: Client,
    secret_name: String,
    secret_key: String,
}

impl SecretCredentialSource {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            secret_name: config.secret_name.clone(),
            secret_key: config.secret_key.clone(),
        }
    }
}

#[async_trait]
impl CredentialSource for SecretCredentialSource {
    #[instrument(skip(self), fields(secret = %self.secret_name))]
    async fn fetch_unseal_key(&self, namespace: &str) -> Result<UnsealKey> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        let secret = match secrets.get(&self.secret_name).await {
            Ok(s) => s,
            Err(kube::Error::Api(err)) if err.code == 404 => {
                return Err(UnsealerError::NotFound(format!(
                    "secret {}/{}",
                    namespace, self.secret_name
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let Some(value) = secret.data.as_ref().and_then(|d| d.get(&self.secret_key)) else {
            return Err(UnsealerError::NotFound(format!(
                "field '{}' in secret {}/{}",
                self.secret_key, namespace, self.secret_name
            )));
        };

        debug!("Found unseal key in secret {}/{}", namespace, self.secret_name);

        String::from_utf8(value.0.clone())
            .map(UnsealKey)
            .map_err(|e| {
                UnsealerError::InvalidCredential(format!(
                    "field '{}' in secret {}/{} is not valid UTF-8: {}",
                    self.secret_key, namespace, self.secret_name, e
                ))
            })
    }
}
