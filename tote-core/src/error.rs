//! Error types for tote-core

use thiserror::Error;

/// Result type alias for settlement operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error taxonomy for the settlement engine.
///
/// Every entry point is all-or-nothing: when one of these comes back,
/// nothing was mutated. The engine never retries on its own; recovery
/// belongs to the caller (a keeper simply tries again on its next poll).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Caller lacks the capability, oracle membership, or position
    /// ownership the operation requires.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Operation is not valid for the entity's current lifecycle status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed or out-of-range input: outcome counts and indices,
    /// feed ids, target prices, stake bounds.
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation attempted outside its permitted time window.
    #[error("timing error: {0}")]
    Timing(String),

    /// Cross-entity identifier mismatch, or a ledger movement that would
    /// break pool accounting.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// The referenced position was already claimed or consumed.
    #[error("already done: {0}")]
    AlreadyDone(String),

    /// The referenced entity does not exist in this engine.
    #[error("not found: {0}")]
    NotFound(String),
}
