// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording notification bus mock.

use std::sync::Mutex;

use async_trait::async_trait;

use plura_core::{NotificationBus, PluraError};

/// A `NotificationBus` that records every broadcast.
#[derive(Default)]
pub struct MockBus {
    broadcasts: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// All broadcasts so far, in call order.
    pub fn broadcasts(&self) -> Vec<(String, serde_json::Value)> {
        self.broadcasts.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationBus for MockBus {
    async fn broadcast(
        &self,
        topic: &str,
        payload: serde_json::Value,
    ) -> Result<(), PluraError> {
        self.broadcasts
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}
