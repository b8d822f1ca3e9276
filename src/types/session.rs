// Copyright 2026 Microsoft Corporation
// SPDX-License-Identifier: Apache-2.0

//! The Session custom resource: a time-limited break-glass access request
//! against a hosted control plane.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SessiongateError};
use crate::types::conditions::{
    session_condition_set, Condition, ConditionManager, ConditionStatus,
    CONDITION_TYPE_AUTHORIZATION_POLICY_AVAILABLE, CONDITION_TYPE_CREDENTIALS_AVAILABLE,
    CONDITION_TYPE_NETWORK_PATH_AVAILABLE, CONDITION_TYPE_SESSION_ACTIVE, REASON_AS_EXPECTED,
};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[kube(group = "sessiongate.aro-hcp.azure.com", version = "v1alpha1", kind = "Session")]
#[kube(namespaced)]
#[kube(status = "SessionStatus")]
#[serde(rename_all = "camelCase")]
pub struct SessionSpec {
    /// Time-to-live for the session, e.g. "8h". The session is deleted once
    /// this much time has passed since it was first reconciled.
    pub ttl: String,
    pub management_cluster: ManagementCluster,
    pub hosted_control_plane: HostedControlPlane,
    pub access_level: AccessLevel,
    pub owner: Principal,
}

/// The AKS management cluster hosting the control plane.
#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagementCluster {
    /// Azure resource ID of the management cluster.
    pub resource_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostedControlPlane {
    /// Azure resource ID of the hosted cluster.
    pub resource_id: String,
    /// Namespace of the hosted control plane on the management cluster.
    pub namespace: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessLevel {
    /// Name of the access group granted for the session.
    pub group: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub enum PrincipalType {
    User,
}

/// The authenticated entity that owns this session.
#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    #[serde(rename = "type")]
    pub principal_type: PrincipalType,
    /// Required when type is User.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_principal: Option<UserPrincipal>,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPrincipal {
    /// User principal name, e.g. an Azure AD UPN like user@domain.com.
    pub name: String,
    /// JWT claim used for authentication ("upn", "email", "sub").
    pub claim: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// When the session expires. Set once on first reconcile, immutable after.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub credentials_secret_ref: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub authorization_policy_ref: String,
    #[serde(default, rename = "backendKASURL", skip_serializing_if = "String::is_empty")]
    pub backend_kas_url: String,
}

impl Session {
    /// Whether the aggregate Ready condition is True.
    pub fn is_ready(&self) -> bool {
        self.ready_condition()
            .is_some_and(|c| c.status == ConditionStatus::True)
    }

    /// The aggregate Ready condition, if set.
    pub fn ready_condition(&self) -> Option<Condition> {
        let status = self.status.as_ref()?;
        let set = session_condition_set();
        status
            .conditions
            .iter()
            .find(|c| c.condition_type == set.ready_type())
            .cloned()
    }

    /// Parse spec.ttl into a duration.
    pub fn ttl(&self) -> Result<Duration> {
        parse_ttl(&self.spec.ttl)
    }

    /// Whether the session's expiry time has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.expires_at)
            .is_some_and(|expires_at| expires_at <= now)
    }

    pub fn initialize_conditions(&mut self) {
        self.with_conditions(|mgr| mgr.initialize_conditions());
    }

    pub fn mark_session_active(&mut self) {
        self.with_conditions(|mgr| {
            mgr.mark_true(CONDITION_TYPE_SESSION_ACTIVE, REASON_AS_EXPECTED, "Session is active")
        });
    }

    pub fn mark_session_inactive(&mut self, reason: &str, message: &str) {
        self.with_conditions(|mgr| mgr.mark_false(CONDITION_TYPE_SESSION_ACTIVE, reason, message));
    }

    pub fn mark_credentials_ready(&mut self) {
        self.with_conditions(|mgr| {
            mgr.mark_true(
                CONDITION_TYPE_CREDENTIALS_AVAILABLE,
                REASON_AS_EXPECTED,
                "Credentials Secret exists",
            )
        });
    }

    pub fn mark_credentials_not_ready(&mut self, reason: &str, message: &str) {
        self.with_conditions(|mgr| {
            mgr.mark_false(CONDITION_TYPE_CREDENTIALS_AVAILABLE, reason, message)
        });
    }

    pub fn mark_authorization_policy_ready(&mut self) {
        self.with_conditions(|mgr| {
            mgr.mark_true(
                CONDITION_TYPE_AUTHORIZATION_POLICY_AVAILABLE,
                REASON_AS_EXPECTED,
                "Authorization policy exists",
            )
        });
    }

    pub fn mark_authorization_policy_not_ready(&mut self, reason: &str, message: &str) {
        self.with_conditions(|mgr| {
            mgr.mark_false(CONDITION_TYPE_AUTHORIZATION_POLICY_AVAILABLE, reason, message)
        });
    }

    pub fn mark_network_path_ready(&mut self) {
        self.with_conditions(|mgr| {
            mgr.mark_true(
                CONDITION_TYPE_NETWORK_PATH_AVAILABLE,
                REASON_AS_EXPECTED,
                "Network path exists",
            )
        });
    }

    pub fn mark_network_path_not_ready(&mut self, reason: &str, message: &str) {
        self.with_conditions(|mgr| {
            mgr.mark_false(CONDITION_TYPE_NETWORK_PATH_AVAILABLE, reason, message)
        });
    }

    pub fn progressing(&mut self, reason: &str, message: &str) {
        let progressing = session_condition_set().progressing_type().to_string();
        self.with_conditions(|mgr| mgr.mark_true(&progressing, reason, message));
    }

    pub fn stop_progressing(&mut self, reason: &str, message: &str) {
        let progressing = session_condition_set().progressing_type().to_string();
        self.with_conditions(|mgr| mgr.mark_false(&progressing, reason, message));
    }

    fn with_conditions(&mut self, f: impl FnOnce(&mut ConditionManager<'_>)) {
        let generation = self.metadata.generation.unwrap_or(0);
        let status = self.status.get_or_insert_with(SessionStatus::default);
        let mut mgr = session_condition_set().manage(&mut status.conditions, generation);
        f(&mut mgr);
    }
}

/// Parse a Kubernetes-style duration string ("30s", "5m", "8h", "1d").
pub fn parse_ttl(ttl: &str) -> Result<Duration> {
    let trimmed = ttl.trim();
    if trimmed.is_empty() {
        return Err(SessiongateError::InvalidTtl("ttl cannot be empty".to_string()));
    }

    let pattern = regex::Regex::new(r"^(?P<number>\d+)(?P<unit>[smhd])$")
        .map_err(|e| SessiongateError::InvalidTtl(format!("failed to compile regex: {e}")))?;
    let lowered = trimmed.to_lowercase();
    let captures = pattern.captures(&lowered).ok_or_else(|| {
        SessiongateError::InvalidTtl(format!(
            "invalid duration '{trimmed}', expected <number><unit> (e.g. '30s', '5m', '8h', '1d')"
        ))
    })?;

    let number: u64 = captures["number"]
        .parse()
        .map_err(|e| SessiongateError::InvalidTtl(format!("invalid number in '{trimmed}': {e}")))?;
    if number == 0 {
        return Err(SessiongateError::InvalidTtl(format!(
            "ttl must be a positive duration, got '{trimmed}'"
        )));
    }

    let seconds = match &captures["unit"] {
        "s" => number,
        "m" => number * 60,
        "h" => number * 3600,
        "d" => number * 86400,
        unit => {
            return Err(SessiongateError::InvalidTtl(format!(
                "invalid unit '{unit}' in '{trimmed}'"
            )))
        }
    };

    Ok(Duration::from_secs(seconds))
}
