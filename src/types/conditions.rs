// Copyright 2026 Microsoft Corporation
// SPDX-License-Identifier: Apache-2.0

//! Status conditions and the aggregation engine that derives the Ready
//! condition from its dependants.
//!
//! A [`ConditionSet`] describes the condition schema for a resource kind: the
//! ready type, the progressing type, and the dependant types whose states roll
//! up into ready. A [`ConditionManager`] applies writes to a condition list
//! and keeps the ready condition mirroring the worst dependant (False beats
//! Unknown, most recent transition wins within the same status).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const REASON_UNKNOWN: &str = "Unknown";
pub const REASON_EXPIRED: &str = "Expired";
pub const REASON_MINTING_CREDENTIALS: &str = "MintingCredentials";
pub const REASON_HOSTED_CONTROL_PLANE_NOT_FOUND: &str = "HostedControlPlaneNotFound";
pub const REASON_INVALID_CONFIGURATION: &str = "InvalidConfiguration";
pub const REASON_AVAILABLE: &str = "Available";
pub const REASON_AS_EXPECTED: &str = "AsExpected";

pub const CONDITION_TYPE_READY: &str = "Ready";
pub const CONDITION_TYPE_SESSION_ACTIVE: &str = "SessionActive";
pub const CONDITION_TYPE_PROGRESSING: &str = "Progressing";
pub const CONDITION_TYPE_CREDENTIALS_AVAILABLE: &str = "CredentialsAvailable";
pub const CONDITION_TYPE_AUTHORIZATION_POLICY_AVAILABLE: &str = "AuthorizationPolicyAvailable";
pub const CONDITION_TYPE_NETWORK_PATH_AVAILABLE: &str = "NetworkPathAvailable";

/// Status of a condition: True, False, or Unknown.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// A timestamped status fact about one aspect of a resource.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub observed_generation: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// The condition schema for a resource kind. Immutable; construct once and
/// hand it to [`ConditionSet::manage`] for every write.
#[derive(Clone, Debug)]
pub struct ConditionSet {
    ready: String,
    progressing: String,
    dependants: Vec<String>,
}

impl ConditionSet {
    /// Build a condition set. The ready and progressing types are never
    /// aggregation members, so they are stripped from `dependants` if present.
    pub fn new(
        ready: impl Into<String>,
        progressing: impl Into<String>,
        dependants: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let ready = ready.into();
        let progressing = progressing.into();
        let dependants = dependants
            .into_iter()
            .map(Into::into)
            .filter(|d| *d != ready && *d != progressing)
            .collect();
        Self {
            ready,
            progressing,
            dependants,
        }
    }

    pub fn ready_type(&self) -> &str {
        &self.ready
    }

    pub fn progressing_type(&self) -> &str {
        &self.progressing
    }

    /// Bind this schema to a resource's condition list and spec generation.
    pub fn manage(self, conditions: &mut Vec<Condition>, generation: i64) -> ConditionManager<'_> {
        ConditionManager {
            set: self,
            conditions,
            generation,
        }
    }
}

/// Applies condition writes for a single resource and recomputes the ready
/// aggregate after each one. Operates purely in memory; persisting the list
/// is the caller's concern.
pub struct ConditionManager<'a> {
    set: ConditionSet,
    conditions: &'a mut Vec<Condition>,
    generation: i64,
}

impl ConditionManager<'_> {
    /// Find the condition with the given type, if any.
    pub fn get_condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    /// Find the ready condition, if any.
    pub fn get_ready_condition(&self) -> Option<&Condition> {
        self.get_condition(&self.set.ready)
    }

    /// Seed the ready, progressing, and dependant conditions to Unknown where
    /// they are not set yet. Existing conditions are left untouched.
    pub fn initialize_conditions(&mut self) {
        let mut types = vec![self.set.ready.clone(), self.set.progressing.clone()];
        types.extend(self.set.dependants.iter().cloned());
        for t in types {
            if self.get_condition(&t).is_none() {
                self.set_condition(Condition {
                    condition_type: t,
                    status: ConditionStatus::Unknown,
                    reason: REASON_UNKNOWN.to_string(),
                    message: String::new(),
                    observed_generation: 0,
                    last_transition_time: None,
                });
            }
        }
    }

    /// Mark the condition as true and recompute the ready aggregate.
    pub fn mark_true(&mut self, condition_type: &str, reason: &str, message: &str) {
        self.mark(condition_type, ConditionStatus::True, reason, message);
    }

    /// Mark the condition as false and recompute the ready aggregate.
    pub fn mark_false(&mut self, condition_type: &str, reason: &str, message: &str) {
        self.mark(condition_type, ConditionStatus::False, reason, message);
    }

    fn mark(&mut self, condition_type: &str, status: ConditionStatus, reason: &str, message: &str) {
        self.set_condition(Condition {
            condition_type: condition_type.to_string(),
            status,
            reason: reason.to_string(),
            message: message.to_string(),
            observed_generation: self.generation,
            last_transition_time: None,
        });
        self.recompute_ready(condition_type);
    }

    /// Set or replace the condition for the candidate's type. A write that
    /// changes neither status, reason, message, nor observed generation is a
    /// no-op and does not bump the transition timestamp. The list stays
    /// sorted by type with at most one entry per type.
    fn set_condition(&mut self, mut cond: Condition) {
        if cond.reason.is_empty() {
            cond.reason = REASON_UNKNOWN.to_string();
        }
        if let Some(existing) = self.get_condition(&cond.condition_type) {
            if existing.status == cond.status
                && existing.reason == cond.reason
                && existing.message == cond.message
                && existing.observed_generation == cond.observed_generation
            {
                return;
            }
        }
        self.conditions
            .retain(|c| c.condition_type != cond.condition_type);
        cond.last_transition_time = Some(Utc::now());
        self.conditions.push(cond);
        self.conditions
            .sort_by(|a, b| a.condition_type.cmp(&b.condition_type));
    }

    /// Re-derive the ready condition: mirror the unhappiest dependant if one
    /// exists, otherwise set ready to true. Skips the self-write when the
    /// condition that just changed is the ready condition itself.
    fn recompute_ready(&mut self, changed_type: &str) {
        if let Some(unhappy) = self.find_unhappy_dependant() {
            self.set_condition(Condition {
                condition_type: self.set.ready.clone(),
                status: unhappy.status,
                reason: unhappy.reason,
                message: unhappy.message,
                observed_generation: self.generation,
                last_transition_time: None,
            });
        } else if changed_type != self.set.ready {
            self.set_condition(Condition {
                condition_type: self.set.ready.clone(),
                status: ConditionStatus::True,
                reason: self.set.ready.clone(),
                message: "Session is ready".to_string(),
                observed_generation: self.generation,
                last_transition_time: None,
            });
        }
    }

    /// Pick the dependant to surface on the ready condition: among dependants
    /// that are not True, the most recently transitioned False entry, or
    /// failing that the most recently transitioned Unknown entry.
    fn find_unhappy_dependant(&self) -> Option<Condition> {
        if self.set.dependants.is_empty() {
            return None;
        }

        let mut unhappy: Vec<&Condition> = self
            .set
            .dependants
            .iter()
            .filter_map(|t| self.get_condition(t))
            .filter(|c| c.status != ConditionStatus::True)
            .collect();

        // Most recent transition first.
        unhappy.sort_by(|a, b| b.last_transition_time.cmp(&a.last_transition_time));

        unhappy
            .iter()
            .find(|c| c.status == ConditionStatus::False)
            .or_else(|| {
                unhappy
                    .iter()
                    .find(|c| c.status == ConditionStatus::Unknown)
            })
            .map(|c| (*c).clone())
    }
}

/// The condition schema shared by all Session resources.
pub fn session_condition_set() -> ConditionSet {
    ConditionSet::new(
        CONDITION_TYPE_READY,
        CONDITION_TYPE_PROGRESSING,
        [
            CONDITION_TYPE_SESSION_ACTIVE,
            CONDITION_TYPE_CREDENTIALS_AVAILABLE,
            CONDITION_TYPE_AUTHORIZATION_POLICY_AVAILABLE,
            CONDITION_TYPE_NETWORK_PATH_AVAILABLE,
        ],
    )
}
