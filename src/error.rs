// Copyright 2026 Microsoft Corporation
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessiongateError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Invalid ttl: {0}")]
    InvalidTtl(String),

    #[error("Invalid session configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, SessiongateError>;
