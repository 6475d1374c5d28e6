use thiserror::Error;

/// Errors raised while building or dissolving an arrangement.
#[derive(Debug, Error)]
pub enum ArrangementError {
    /// The snapping grid needs a finite, strictly positive cell size.
    #[error("snap epsilon must be finite and positive, got {0}")]
    InvalidEpsilon(f64),

    /// A coordinate is non-finite or too large to be snapped exactly.
    #[error("coordinate ({x}, {y}) cannot be represented on the snapping grid")]
    CoordinateOutOfRange { x: f64, y: f64 },

    /// The half-edge structure is inconsistent (a bug, not an input error).
    #[error("arrangement topology error: {0}")]
    Topology(String),

    /// A face label slice does not match the number of faces.
    #[error("expected {expected} face labels, got {actual}")]
    LabelCount { expected: usize, actual: usize },
}
