//! Bracket business logic: advancing results and authorization.

mod advance;
mod authorize;

pub use advance::apply_result;
pub use authorize::{Actor, Authorizer, CreatorOnly, CreatorOrAdmin, Role};
