//! Character record model and DTOs.

use covdb_core::staleness::NEVER_REFRESHED;
use covdb_core::types::{DbId, Timestamp};
use covdb_core::Covenant;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from one of the `characters_{region}_{faction}` tables.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Character {
    pub id: DbId,
    pub name: String,
    pub realm: String,
    /// Epoch means "never refreshed"; `None` means the last refresh failed
    /// and the record is due on the next pass.
    pub last_modified: Option<Timestamp>,
    /// Absent until the first successful fetch.
    pub covenant: Option<Json<Covenant>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Character {
    pub fn covenant(&self) -> Option<Covenant> {
        self.covenant.as_ref().map(|c| c.0)
    }
}

/// DTO for inserting a new character.
#[derive(Debug, Clone)]
pub struct NewCharacter {
    pub name: String,
    pub realm: String,
    pub last_modified: Option<Timestamp>,
}

impl NewCharacter {
    /// A character that has never been refreshed and is due immediately.
    pub fn never_refreshed(realm: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            realm: realm.into(),
            last_modified: Some(NEVER_REFRESHED),
        }
    }
}
