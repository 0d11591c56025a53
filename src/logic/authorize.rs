//! Who may report results: acting user plus a pluggable authorization rule.

use crate::models::{Tournament, UserId};
use serde::{Deserialize, Serialize};

/// Role supplied by the identity provider.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Participant,
}

/// The user attempting a write.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn participant(id: UserId) -> Self {
        Self {
            id,
            role: Role::Participant,
        }
    }

    pub fn admin(id: UserId) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }
}

/// Decides whether an actor may submit a match result for a tournament.
pub trait Authorizer: Send + Sync {
    fn may_submit_result(&self, tournament: &Tournament, actor: &Actor) -> bool;
}

/// The tournament creator, or anyone with the admin role.
#[derive(Clone, Copy, Debug, Default)]
pub struct CreatorOrAdmin;

impl Authorizer for CreatorOrAdmin {
    fn may_submit_result(&self, tournament: &Tournament, actor: &Actor) -> bool {
        actor.role == Role::Admin || actor.id == tournament.creator_id
    }
}

/// Only the tournament creator; admins get no override.
#[derive(Clone, Copy, Debug, Default)]
pub struct CreatorOnly;

impl Authorizer for CreatorOnly {
    fn may_submit_result(&self, tournament: &Tournament, actor: &Actor) -> bool {
        actor.id == tournament.creator_id
    }
}
