//! Who is calling. Authentication happens upstream; this only reads the result.

use crate::logic::{Actor, Role};
use thiserror::Error;
use uuid::Uuid;

/// Header carrying the authenticated user's id (set by the auth proxy).
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum IdentityError {
    #[error("No authenticated user")]
    Missing,

    #[error("Invalid user id: {0}")]
    InvalidId(String),

    #[error("Unknown role: {0}")]
    InvalidRole(String),
}

/// Supplies the acting user's identity and role.
pub trait IdentityProvider {
    fn current_user(&self) -> Result<Actor, IdentityError>;
}

/// Fixed identity, for tests and scripted callers.
#[derive(Clone, Copy, Debug)]
pub struct StaticIdentity(pub Actor);

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Result<Actor, IdentityError> {
        Ok(self.0)
    }
}

/// Identity read from raw header values. A missing role means participant.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderIdentity<'a> {
    pub user_id: Option<&'a str>,
    pub role: Option<&'a str>,
}

impl IdentityProvider for HeaderIdentity<'_> {
    fn current_user(&self) -> Result<Actor, IdentityError> {
        let raw = self.user_id.map(str::trim).filter(|s| !s.is_empty());
        let raw = raw.ok_or(IdentityError::Missing)?;
        let id = Uuid::parse_str(raw).map_err(|_| IdentityError::InvalidId(raw.to_string()))?;
        let role = match self.role.map(str::trim) {
            None | Some("") => Role::Participant,
            Some(r) if r.eq_ignore_ascii_case("participant") => Role::Participant,
            Some(r) if r.eq_ignore_ascii_case("admin") => Role::Admin,
            Some(r) => return Err(IdentityError::InvalidRole(r.to_string())),
        };
        Ok(Actor { id, role })
    }
}
