//! Error types for the signal simulation

use thiserror::Error;

use super::types::{ElementPosition, IntersectionId};
use super::world::ObjectId;

/// Failures reported by the host world while mutating it
#[derive(Debug, Error)]
pub enum WorldError {
    /// A placed object could not be created at the given position
    #[error("failed to spawn placed object at {position}: {reason}")]
    SpawnFailed {
        position: ElementPosition,
        reason: String,
    },

    /// The object id no longer refers to a live object
    #[error("placed object {0:?} does not exist")]
    UnknownObject(ObjectId),

    /// The world refused the write
    #[error("write rejected at {position}: {reason}")]
    Rejected {
        position: ElementPosition,
        reason: String,
    },
}

/// Reasons an intersection cannot be handed to the animator
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("intersection '{name}' ({id}) is not complete: {reason}")]
    Incomplete {
        id: IntersectionId,
        name: String,
        reason: &'static str,
    },
}

/// Errors loading the animator configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
