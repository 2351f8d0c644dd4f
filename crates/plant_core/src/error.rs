//! Error types for the plant simulation.
//!
//! Only invalid operator input is an error. Physical damage and terminal
//! component failure are ordinary state transitions reported through tick
//! events, never through this type.

use thiserror::Error;

use crate::components::ComponentId;

/// Result type alias using [`PlantError`].
pub type Result<T> = std::result::Result<T, PlantError>;

/// Top-level error type for all plant simulation errors.
#[derive(Debug, Error)]
pub enum PlantError {
    /// Control-rod insertion percentage outside [0, 100].
    #[error("control rod percentage {0} not in range [0..100]")]
    RodOutOfRange(i32),

    /// A component ID that does not exist in the plant manifest.
    #[error("component not found: {0}")]
    ComponentNotFound(ComponentId),

    /// The addressed component cannot perform the requested operation.
    #[error("invalid plant state: {0}")]
    InvalidState(String),
}
