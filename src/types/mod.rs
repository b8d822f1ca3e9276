// Copyright 2026 Microsoft Corporation
// SPDX-License-Identifier: Apache-2.0

//! API types for the Session custom resource and its status conditions.

pub mod conditions;
pub mod session;

pub use conditions::{Condition, ConditionManager, ConditionSet, ConditionStatus};
pub use session::{Session, SessionSpec, SessionStatus};
