// Copyright 2026 Microsoft Corporation
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::{info, warn};

use sessiongate::config::Config;
use sessiongate::kubernetes::wait_for_session_crd;
use sessiongate::reconcilers::SessionReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting sessiongate controller");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: watch_namespace={}",
        config.watch_namespace.as_deref().unwrap_or("<all>")
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Wait for the Session CRD before starting the reconciler
    info!("Waiting for Session CRD to become available...");
    wait_for_session_crd(&client).await?;

    let session_reconciler = SessionReconciler::new(client, config);

    info!("Starting session reconciler...");
    session_reconciler.run().await?;

    // This should never be reached as the reconciler runs forever
    warn!("Session reconciler stopped unexpectedly");
    Ok(())
}
