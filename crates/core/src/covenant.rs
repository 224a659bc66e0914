//! Covenant sub-record stored on each refreshed character.

use serde::{Deserialize, Serialize};

/// Covenant id meaning "no covenant chosen".
pub const NO_COVENANT: i32 = 0;

/// Kyrian, Venthyr, Night Fae, Necrolord.
pub const COVENANT_IDS: [i32; 4] = [1, 2, 3, 4];

/// Covenant data as persisted in the `covenant` JSONB column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Covenant {
    pub renown_level: i32,
    pub chosen_covenant_id: i32,
}

impl Covenant {
    /// Merge freshly fetched values into an existing sub-record, creating
    /// it if the character had none yet.
    pub fn merge(existing: Option<Covenant>, renown_level: i32, chosen_covenant_id: i32) -> Self {
        let mut covenant = existing.unwrap_or_default();
        covenant.renown_level = renown_level;
        covenant.chosen_covenant_id = chosen_covenant_id;
        covenant
    }

    pub fn has_chosen(&self) -> bool {
        self.chosen_covenant_id != NO_COVENANT
    }
}
