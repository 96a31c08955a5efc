//! Error types shared across the copperweave workspace.

use thiserror::Error;

/// Errors produced by the routing core.
#[derive(Debug, Error)]
pub enum Error {
    /// The board input failed up-front validation.
    #[error("Invalid board: {0}")]
    InvalidBoard(String),

    /// A layer name is not part of the board's declared stackup.
    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    /// The board declares a conductor layer count this core does not route.
    #[error("Unsupported layer count: {0} (only two-layer boards are supported)")]
    UnsupportedLayerCount(usize),

    /// An internal invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownLayer("inner3".to_string());
        assert!(err.to_string().contains("inner3"));

        let err = Error::UnsupportedLayerCount(4);
        assert!(err.to_string().contains('4'));
    }
}
