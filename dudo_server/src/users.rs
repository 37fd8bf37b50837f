//! User directory collaborator.
//!
//! The game only ever needs "give me the user record for this id";
//! identity storage itself is someone else's system. [`UserDirectory`]
//! is that seam, and [`MemoryUserDirectory`] is the in-process
//! implementation this server ships with.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque user record as returned by the directory.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
}

/// Lookup service for user identities.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get(&self, id: Uuid) -> Option<UserRecord>;
}

/// In-memory directory keyed by user id.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: DashMap<Uuid, UserRecord>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new user under a fresh id.
    pub fn register(&self, name: String) -> UserRecord {
        let record = UserRecord {
            id: Uuid::new_v4(),
            name,
        };
        self.users.insert(record.id, record.clone());
        log::info!("registered user {} ({})", record.name, record.id);
        record
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn get(&self, id: Uuid) -> Option<UserRecord> {
        self.users.get(&id).map(|r| r.value().clone())
    }
}
