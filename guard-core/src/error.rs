//! Error types for the guard core library.
//!
//! Only configuration and construction boundaries return errors. Runtime
//! degradations (lost targets, unreachable probes, expired timers) are
//! modelled as ordinary state transitions.

use thiserror::Error;

/// Top-level error type for all guard-core operations.
#[derive(Error, Debug)]
pub enum GuardError {
    /// Configuration could not be parsed or is out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A patrol route failed validation.
    #[error("Invalid patrol route '{route}': {reason}")]
    InvalidRoute {
        /// Name of the offending route.
        route: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A required collaborator was not wired up for a guard.
    #[error("Guard {guard} is missing its {component}")]
    MissingReference {
        /// The guard that is misconfigured.
        guard: crate::EntityId,
        /// Which collaborator is missing.
        component: &'static str,
    },

    /// Entity not found in the scene.
    #[error("Entity not found: {0}")]
    EntityNotFound(crate::EntityId),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, GuardError>;
