// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{controller, requeue, secret};
use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the secret holding the unseal key, looked up in the pod's namespace
    pub secret_name: String,
    /// Field of the secret containing the unseal key
    pub secret_key: String,
    /// Restrict the pod watch to a single namespace
    pub watch_namespace: Option<String>,
    pub max_concurrent_reconciles: u16,
    pub exec_timeout: Duration,
    pub error_requeue: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            secret_name: secret::DEFAULT_NAME.to_string(),
            secret_key: secret::DEFAULT_KEY.to_string(),
            watch_namespace: None,
            max_concurrent_reconciles: controller::DEFAULT_CONCURRENCY,
            exec_timeout: Duration::from_secs(controller::DEFAULT_EXEC_TIMEOUT_SECS),
            error_requeue: Duration::from_secs(requeue::DEFAULT_ERROR_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let max_concurrent_reconciles: u16 = parse_var(&lookup, "MAX_CONCURRENT_RECONCILES")?
            .unwrap_or(defaults.max_concurrent_reconciles);
        if max_concurrent_reconciles == 0 {
            bail!("MAX_CONCURRENT_RECONCILES must be greater than 0");
        }

        let exec_timeout_secs: u64 = parse_var(&lookup, "EXEC_TIMEOUT_SECS")?
            .unwrap_or(controller::DEFAULT_EXEC_TIMEOUT_SECS);
        if exec_timeout_secs == 0 {
            bail!("EXEC_TIMEOUT_SECS must be greater than 0");
        }

        let error_requeue_secs: u64 =
            parse_var(&lookup, "ERROR_REQUEUE_SECS")?.unwrap_or(requeue::DEFAULT_ERROR_SECS);

        Ok(Config {
            secret_name: lookup("UNSEAL_SECRET_NAME").unwrap_or(defaults.secret_name),
            secret_key: lookup("UNSEAL_SECRET_KEY").unwrap_or(defaults.secret_key),
            watch_namespace: lookup("WATCH_NAMESPACE").filter(|ns| !ns.is_empty()),
            max_concurrent_reconciles,
            exec_timeout: Duration::from_secs(exec_timeout_secs),
            error_requeue: Duration::from_secs(error_requeue_secs),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|v| {
            v.parse::<T>()
                .with_context(|| format!("{} has an invalid value: {}", name, v))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = load(&[]).unwrap();

        assert_eq!(config.secret_name, "openbao-unseal-key");
        assert_eq!(config.secret_key, "unseal-key");
        assert_eq!(config.watch_namespace, None);
        assert_eq!(config.max_concurrent_reconciles, 5);
        assert_eq!(config.exec_timeout, Duration::from_secs(60));
        assert_eq!(config.error_requeue, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides_from_env() {
        let config = load(&[
            ("UNSEAL_SECRET_NAME", "bao-keys"),
            ("UNSEAL_SECRET_KEY", "key-1"),
            ("WATCH_NAMESPACE", "vault"),
            ("MAX_CONCURRENT_RECONCILES", "2"),
            ("EXEC_TIMEOUT_SECS", "15"),
            ("ERROR_REQUEUE_SECS", "20"),
        ])
        .unwrap();

        assert_eq!(config.secret_name, "bao-keys");
        assert_eq!(config.secret_key, "key-1");
        assert_eq!(config.watch_namespace.as_deref(), Some("vault"));
        assert_eq!(config.max_concurrent_reconciles, 2);
        assert_eq!(config.exec_timeout, Duration::from_secs(15));
        assert_eq!(config.error_requeue, Duration::from_secs(20));
    }

    #[test]
    fn test_empty_watch_namespace_means_all() {
        let config = load(&[("WATCH_NAMESPACE", "")]).unwrap();
        assert_eq!(config.watch_namespace, None);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        assert!(load(&[("EXEC_TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        assert!(load(&[("MAX_CONCURRENT_RECONCILES", "0")]).is_err());
    }
}
