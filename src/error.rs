//! Errors surfaced by the public API.
//!
//! Per-tick systems never fail; only commands issued from outside the
//! simulation (spawning, damage intake, config and layout loading) do.

use crate::components::{Category, EntityId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("no live entity with id {0}")]
    UnknownEntity(EntityId),

    #[error("entity {id} is {actual:?}, expected {expected}")]
    WrongCategory {
        id: EntityId,
        actual: Category,
        expected: &'static str,
    },

    #[error("boss gate {0} is not revealed")]
    GateNotRevealed(EntityId),

    #[error("the world has no player")]
    NoPlayer,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid level: {0}")]
    InvalidLevel(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
