//! Entrant: a team or player occupying bracket slots.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an entrant.
pub type EntrantId = Uuid;

/// A team or player in the tournament. Carries no behavior; matches refer to it by value.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    pub id: EntrantId,
    pub name: String,
}

impl Entrant {
    /// Create an entrant with a fresh id. The name is trimmed.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
        }
    }
}
