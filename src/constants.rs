// Copyright 2026 Microsoft Corporation
// SPDX-License-Identifier: Apache-2.0

/// Field manager recorded on status patches made by this controller
pub const OPERATOR_NAME: &str = "sessiongate";

/// Prefix for session-owned objects (credential Secrets, authorization policies)
pub const SESSION_PREFIX: &str = "session-";
/// Suffix for session credential Secrets
pub const SESSION_SECRET_SUFFIX: &str = "-credentials";

/// Name of the kube-apiserver Service inside a hosted control plane namespace
pub const KAS_SERVICE_NAME: &str = "kube-apiserver";

/// Identity of the Session CRD and the polling schedule used while waiting
/// for the API server to serve it.
pub mod crd {
    pub const GROUP: &str = "sessiongate.aro-hcp.azure.com";
    pub const VERSION: &str = "v1alpha1";
    pub const KIND: &str = "Session";

    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// Name of the credential Secret for a session.
pub fn credentials_secret_name(session_name: &str) -> String {
    format!("{SESSION_PREFIX}{session_name}{SESSION_SECRET_SUFFIX}")
}

/// Name of the authorization policy object for a session.
pub fn authorization_policy_name(session_name: &str) -> String {
    format!("{SESSION_PREFIX}{session_name}")
}
