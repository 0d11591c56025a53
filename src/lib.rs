//! Single-elimination bracket engine: models, result advancement, storage and service layer.

pub mod config;
pub mod identity;
pub mod logic;
pub mod models;
pub mod service;
pub mod store;

pub use config::ServerConfig;
pub use identity::{HeaderIdentity, IdentityError, IdentityProvider, StaticIdentity};
pub use logic::{apply_result, Actor, Authorizer, CreatorOnly, CreatorOrAdmin, Role};
pub use models::{
    Entrant, EntrantId, Match, MatchId, MatchResult, MatchState, Round, Score, Slot, Tournament,
    TournamentError, TournamentId, TournamentResult, TournamentState, UserId,
};
pub use service::{BracketService, ServiceError, ServiceResult};
pub use store::{InMemoryStore, Revision, StoreError, StoreResult, TournamentStore, Versioned};
