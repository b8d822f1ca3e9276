// Copyright 2026 Microsoft Corporation
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that react to watch events.

pub mod session;

pub use session::SessionReconciler;
