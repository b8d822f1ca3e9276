// Copyright 2026 Microsoft Corporation
// SPDX-License-Identifier: Apache-2.0

//! Startup gate: block until the API server serves the Session CRD.

use crate::constants::crd::{GROUP, KIND, POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS, VERSION};
use crate::error::Result;
use kube::core::GroupVersionKind;
use kube::{discovery::Discovery, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Block until the Session CRD is served, backing off between discovery runs.
pub async fn wait_for_session_crd(client: &Client) -> Result<()> {
    let mut backoff = Duration::from_secs(POLL_INTERVAL_SECS);

    loop {
        match session_crd_established(client).await {
            Ok(true) => {
                info!("{}.{}/{} is served, starting up", KIND, GROUP, VERSION);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "{}.{} is not served yet, next discovery run in {:?}",
                    KIND, GROUP, backoff
                );
            }
            Err(e) => {
                warn!("API discovery failed: {}, retrying in {:?}", e, backoff);
            }
        }

        sleep(backoff).await;
        backoff = (backoff * 2).min(Duration::from_secs(POLL_MAX_INTERVAL_SECS));
    }
}

/// Run a discovery pass scoped to the Session group and resolve the kind.
async fn session_crd_established(client: &Client) -> Result<bool> {
    let discovery = Discovery::new(client.clone()).filter(&[GROUP]).run().await?;
    let gvk = GroupVersionKind::gvk(GROUP, VERSION, KIND);
    Ok(discovery.resolve_gvk(&gvk).is_some())
}
