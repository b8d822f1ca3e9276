// Copyright 2026 Microsoft Corporation
// SPDX-License-Identifier: Apache-2.0

//! Session reconciler - drives break-glass sessions to readiness and expiry.
//!
//! Each pass initializes conditions, pins the expiry time, then walks the
//! dependant aspects in order: authorization policy, credentials, network
//! path. Every aspect writes its own condition; the Ready aggregate follows
//! from the condition engine. Expired sessions are deleted.

use crate::config::Config;
use crate::constants::{
    authorization_policy_name, credentials_secret_name, KAS_SERVICE_NAME, OPERATOR_NAME,
};
use crate::error::{Result, SessiongateError};
use crate::types::conditions::{
    REASON_AVAILABLE, REASON_EXPIRED, REASON_HOSTED_CONTROL_PLANE_NOT_FOUND,
    REASON_INVALID_CONFIGURATION, REASON_MINTING_CREDENTIALS,
};
use crate::types::session::{parse_ttl, PrincipalType, Session, SessionStatus};
use chrono::Utc;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{Namespace, Secret, Service};
use kube::{
    api::{DeleteParams, Patch, PatchParams},
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Requeue interval while the hosted control plane namespace or its
/// kube-apiserver Service does not exist yet.
const HCP_POLL_INTERVAL: Duration = Duration::from_secs(60);

pub struct SessionReconciler {
    client: Client,
    config: Config,
}

impl SessionReconciler {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let sessions: Api<Session> = match &self.config.watch_namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let context = Arc::new(self);

        Controller::new(sessions, WatcherConfig::default())
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled session: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile(session: Arc<Session>, ctx: Arc<SessionReconciler>) -> Result<Action> {
    let name = session.name_any();
    let namespace = session.namespace().unwrap_or_default();

    // Cleanup of dependent resources happens via owner references.
    if session.metadata.deletion_timestamp.is_some() {
        debug!("Session {}/{} is being deleted, skipping", namespace, name);
        return Ok(Action::await_change());
    }

    debug!("Reconciling session: {}/{}", namespace, name);

    let mut session = (*session).clone();
    let original_status = session.status.clone();
    session.initialize_conditions();

    if let Err(e) = validate_session(&session) {
        warn!("Session {}/{} has invalid configuration: {}", namespace, name, e);
        session.stop_progressing(REASON_INVALID_CONFIGURATION, &e.to_string());
        patch_status(&ctx.client, &namespace, &name, &session, &original_status).await?;
        return Ok(Action::await_change());
    }

    // Pin the expiry time on first reconcile; immutable afterwards.
    let now = Utc::now();
    let ttl = chrono::Duration::from_std(session.ttl()?)
        .map_err(|e| SessiongateError::InvalidTtl(e.to_string()))?;
    let expires_at = match session.status.as_ref().and_then(|s| s.expires_at) {
        Some(t) => t,
        None => now + ttl,
    };
    status_mut(&mut session).expires_at = Some(expires_at);

    if expires_at <= now {
        info!(
            "Session {}/{} has expired at {}, deleting",
            namespace, name, expires_at
        );
        session.mark_session_inactive(REASON_EXPIRED, "Session has expired");
        session.stop_progressing(REASON_EXPIRED, "Session has expired");
        patch_status(&ctx.client, &namespace, &name, &session, &original_status).await?;

        let sessions: Api<Session> = Api::namespaced(ctx.client.clone(), &namespace);
        sessions.delete(&name, &DeleteParams::default()).await?;
        return Ok(Action::await_change());
    }
    let time_until_expiry = (expires_at - now).to_std().unwrap_or(Duration::ZERO);

    // Authorization policy: named deterministically, owned by the session.
    // Enforcement lives with the data plane.
    status_mut(&mut session).authorization_policy_ref = authorization_policy_name(&name);
    session.mark_authorization_policy_ready();

    // Credentials: minted out of band into a well-known Secret. Poll until
    // the Secret shows up.
    let secret_name = credentials_secret_name(&name);
    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), &namespace);
    match secrets.get_opt(&secret_name).await? {
        Some(_) => {
            status_mut(&mut session).credentials_secret_ref = secret_name;
            session.mark_credentials_ready();
        }
        None => {
            debug!(
                "Credentials Secret {}/{} not found, will poll",
                namespace, secret_name
            );
            session.mark_credentials_not_ready(
                REASON_MINTING_CREDENTIALS,
                &format!("Waiting for credentials Secret {secret_name}"),
            );
            session.progressing(REASON_MINTING_CREDENTIALS, "Waiting for credentials to be minted");
            patch_status(&ctx.client, &namespace, &name, &session, &original_status).await?;
            // Never poll past the session's own expiry.
            return Ok(Action::requeue(
                ctx.config.credential_check_interval.min(time_until_expiry),
            ));
        }
    }

    // Network path: the hosted control plane namespace and its kube-apiserver
    // Service must exist on the management cluster.
    let hcp_namespace = session.spec.hosted_control_plane.namespace.clone();
    let namespaces: Api<Namespace> = Api::all(ctx.client.clone());
    let kas_services: Api<Service> = Api::namespaced(ctx.client.clone(), &hcp_namespace);
    let hcp_reachable = namespaces.get_opt(&hcp_namespace).await?.is_some()
        && kas_services.get_opt(KAS_SERVICE_NAME).await?.is_some();
    if !hcp_reachable {
        debug!(
            "HostedControlPlane namespace {} not reachable, will poll",
            hcp_namespace
        );
        session.mark_network_path_not_ready(
            REASON_HOSTED_CONTROL_PLANE_NOT_FOUND,
            "HostedControlPlane not yet available",
        );
        session.progressing(
            REASON_HOSTED_CONTROL_PLANE_NOT_FOUND,
            "Waiting for HostedControlPlane to be created",
        );
        patch_status(&ctx.client, &namespace, &name, &session, &original_status).await?;
        return Ok(Action::requeue(HCP_POLL_INTERVAL.min(time_until_expiry)));
    }
    status_mut(&mut session).backend_kas_url =
        format!("https://{KAS_SERVICE_NAME}.{hcp_namespace}.svc");
    session.mark_network_path_ready();

    session.mark_session_active();
    if let Some(base) = &ctx.config.ingress_base_url {
        status_mut(&mut session).endpoint = format!("{base}/sessions/{namespace}/{name}");
    }
    session.stop_progressing(REASON_AVAILABLE, "Session is available");

    patch_status(&ctx.client, &namespace, &name, &session, &original_status).await?;

    info!(
        "Session {}/{} is ready, expires at {}",
        namespace, name, expires_at
    );
    Ok(Action::requeue(time_until_expiry))
}

fn error_policy(
    _session: Arc<Session>,
    error: &SessiongateError,
    _ctx: Arc<SessionReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(Duration::from_secs(60))
}

fn status_mut(session: &mut Session) -> &mut SessionStatus {
    session.status.get_or_insert_with(SessionStatus::default)
}

/// Patch the status subresource, but only when it actually changed this pass.
async fn patch_status(
    client: &Client,
    namespace: &str,
    name: &str,
    session: &Session,
    original: &Option<SessionStatus>,
) -> Result<()> {
    if session.status == *original {
        debug!("Session {}/{} status unchanged, skipping patch", namespace, name);
        return Ok(());
    }

    let sessions: Api<Session> = Api::namespaced(client.clone(), namespace);
    let patch = serde_json::json!({ "status": session.status });
    let params = PatchParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    };
    sessions
        .patch_status(name, &params, &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/// Validate a Session spec before acting on it. Mirrors the CRD-level
/// validation so a bad object degrades into a condition rather than an error
/// loop.
fn validate_session(session: &Session) -> Result<()> {
    parse_ttl(&session.spec.ttl)?;

    validate_resource_id(
        &session.spec.management_cluster.resource_id,
        "spec.managementCluster.resourceId",
        "Microsoft.ContainerService",
        "managedClusters",
    )?;
    validate_resource_id(
        &session.spec.hosted_control_plane.resource_id,
        "spec.hostedControlPlane.resourceId",
        "Microsoft.RedHatOpenShift",
        "hcpOpenShiftClusters",
    )?;

    if session.spec.hosted_control_plane.namespace.is_empty() {
        return Err(SessiongateError::InvalidConfiguration(
            "spec.hostedControlPlane.namespace is required".to_string(),
        ));
    }
    if session.spec.access_level.group.is_empty() {
        return Err(SessiongateError::InvalidConfiguration(
            "spec.accessLevel.group is required".to_string(),
        ));
    }

    match session.spec.owner.principal_type {
        PrincipalType::User => {
            let principal = session.spec.owner.user_principal.as_ref().ok_or_else(|| {
                SessiongateError::InvalidConfiguration(
                    "spec.owner.userPrincipal is required when type is User".to_string(),
                )
            })?;
            if principal.name.is_empty() {
                return Err(SessiongateError::InvalidConfiguration(
                    "spec.owner.userPrincipal.name is required".to_string(),
                ));
            }
        }
    }

    Ok(())
}

/// Check an Azure resource ID's shape and that it names the expected provider
/// and resource type (both compared case-insensitively).
fn validate_resource_id(
    resource_id: &str,
    field: &str,
    expected_provider: &str,
    expected_type: &str,
) -> Result<()> {
    if resource_id.is_empty() {
        return Err(SessiongateError::InvalidConfiguration(format!(
            "{field} is required"
        )));
    }

    let pattern = Regex::new(
        r"^/subscriptions/[^/]+/resourceGroups/[^/]+/providers/(?P<provider>[^/]+)/(?P<type>[^/]+)/(?P<name>[^/]+)$",
    )
    .map_err(|e| SessiongateError::InvalidConfiguration(format!("failed to compile regex: {e}")))?;
    let captures = pattern.captures(resource_id).ok_or_else(|| {
        SessiongateError::InvalidConfiguration(format!(
            "{field} is not a valid Azure resource ID: {resource_id}"
        ))
    })?;

    if !captures["provider"].eq_ignore_ascii_case(expected_provider)
        || !captures["type"].eq_ignore_ascii_case(expected_type)
    {
        return Err(SessiongateError::InvalidConfiguration(format!(
            "{field} must be a {expected_provider}/{expected_type} resource, got {}/{}",
            &captures["provider"], &captures["type"]
        )));
    }

    Ok(())
}
