// Copyright 2026 Microsoft Corporation
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use std::env;
use std::time::Duration;

const DEFAULT_CREDENTIAL_CHECK_INTERVAL_SECS: u64 = 2;

/// Controller configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace to watch for Session resources. Watches all namespaces when unset.
    pub watch_namespace: Option<String>,
    /// Externally-accessible base URL for session endpoints, e.g. "https://sessiongate.example.com"
    pub ingress_base_url: Option<String>,
    /// How often to poll for the credentials Secret while it is still being minted
    pub credential_check_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let watch_namespace = env::var("WATCH_NAMESPACE").ok().filter(|ns| !ns.is_empty());
        let ingress_base_url = env::var("INGRESS_BASE_URL").ok().filter(|url| !url.is_empty());
        let credential_check_interval_secs: u64 = env::var("CREDENTIAL_CHECK_INTERVAL_SECS")
            .unwrap_or_default()
            .parse()
            .unwrap_or(DEFAULT_CREDENTIAL_CHECK_INTERVAL_SECS);

        Ok(Config {
            watch_namespace,
            ingress_base_url,
            credential_check_interval: Duration::from_secs(credential_check_interval_secs.max(1)),
        })
    }
}
