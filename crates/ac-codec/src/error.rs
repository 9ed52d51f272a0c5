use ac_core::CoreError;
use thiserror::Error;

use crate::payload::CodecTag;

/// Errors originating from the codec module.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Width or height missing, zero, or inconsistent.
    #[error("Métadonnées invalides : {0}")]
    MalformedMetadata(String),

    /// Tag absent from the registry.
    #[error("Codec inconnu : {0}")]
    UnknownCodec(String),

    /// A referenced position or index lies outside the grid.
    #[error("Payload tronqué : position {position} hors de {capacity} cellules")]
    TruncatedPayload {
        /// Offending position.
        position: usize,
        /// `width * height`.
        capacity: usize,
    },

    /// Bitmap palette missing, empty, or not covering the art.
    #[error("Palette incomplète : {0}")]
    IncompletePalette(String),

    /// Bitmap palette has more entries than one byte can index.
    #[error("Palette trop grande : {len} entrées (max 256)")]
    PaletteTooLarge {
        /// Palette length.
        len: usize,
    },

    /// `data` does not have the shape its codec expects.
    #[error("Payload mal formé : {0}")]
    MalformedPayload(String),

    /// No encoder exists for this tag.
    #[error("Pas d'encodeur pour {0}")]
    UnsupportedEncode(CodecTag),
}

impl From<CoreError> for CodecError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MalformedMetadata { width, height } => {
                Self::MalformedMetadata(format!("{width}×{height}"))
            }
            other => Self::MalformedMetadata(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedPayload(e.to_string())
    }
}
