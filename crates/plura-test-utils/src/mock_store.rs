// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory session store with optimistic-concurrency semantics.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use plura_core::{PluraError, Session, SessionStore};

/// A `SessionStore` backed by a mutex-guarded map. Version handling matches
/// a real store: insert assigns version 0, update requires the expected
/// version and increments it.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<Session>, PluraError> {
        Ok(self.sessions.lock().unwrap().get(id).cloned())
    }

    async fn insert(&self, mut session: Session) -> Result<(), PluraError> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&session.id) {
            return Err(PluraError::StoreConflict {
                id: session.id.clone(),
            });
        }
        session.version = 0;
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn update(
        &self,
        mut session: Session,
        expected_version: u64,
    ) -> Result<(), PluraError> {
        let mut sessions = self.sessions.lock().unwrap();
        let current = sessions
            .get(&session.id)
            .ok_or_else(|| PluraError::SessionNotFound {
                id: session.id.clone(),
            })?;
        if current.version != expected_version {
            return Err(PluraError::StoreConflict {
                id: session.id.clone(),
            });
        }
        session.version = expected_version + 1;
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), PluraError> {
        self.sessions.lock().unwrap().remove(id);
        Ok(())
    }
}
