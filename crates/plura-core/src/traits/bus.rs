// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External notification bus contract.

use async_trait::async_trait;

use crate::error::PluraError;

/// Fire-and-forget broadcast boundary. Used to announce auth-flow
/// completion to any interested application component.
#[async_trait]
pub trait NotificationBus: Send + Sync + 'static {
    async fn broadcast(
        &self,
        topic: &str,
        payload: serde_json::Value,
    ) -> Result<(), PluraError>;
}
