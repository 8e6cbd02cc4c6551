use thiserror::Error;

/// Failure taxonomy for mutating operations.
///
/// `NotFound` and `InvalidTopology` reject the operation with no mutation
/// and no history entry. Degenerate geometry inputs are epsilon-corrected
/// where possible; this error covers the cases where they cannot be.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

impl EditError {
    pub fn not_found(what: impl Into<String>) -> Self {
        EditError::NotFound(what.into())
    }

    pub fn invalid_topology(what: impl Into<String>) -> Self {
        EditError::InvalidTopology(what.into())
    }

    pub fn degenerate(what: impl Into<String>) -> Self {
        EditError::DegenerateGeometry(what.into())
    }
}
