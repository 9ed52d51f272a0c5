use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Width or height is missing or zero, or their product overflows.
    #[error("Métadonnées invalides : {width}×{height}")]
    MalformedMetadata {
        /// Width value.
        width: usize,
        /// Height value.
        height: usize,
    },

    /// Two layers that must share a shape do not.
    #[error("Dimensions incompatibles : {expected_width}×{expected_height}, reçu {width}×{height}")]
    InvalidDimensions {
        /// Width of the reference layer.
        expected_width: usize,
        /// Height of the reference layer.
        expected_height: usize,
        /// Width received.
        width: usize,
        /// Height received.
        height: usize,
    },

    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),
}
