use std::fmt;
use std::str::FromStr;

use ac_core::{ColorLayer, Grid, PositionIndex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodecError;

/// Identifiant de format d'un payload (`type` sur le fil).
///
/// # Example
/// ```
/// use ac_codec::payload::CodecTag;
/// assert_eq!("quadTree".parse::<CodecTag>().unwrap(), CodecTag::QuadTree);
/// assert_eq!(CodecTag::UltraMinimal.to_string(), "ultraMinimal");
/// assert!("pattern".parse::<CodecTag>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CodecTag {
    /// Glyph → positions map.
    UltraMinimal,
    /// Glyph → delta-encoded positions.
    Delta,
    /// Run-length pairs.
    Rle,
    /// Palette indices packed into a string.
    Bitmap,
    /// Quad-tree of uniform regions.
    QuadTree,
    /// Two sub-payloads composed through a mask.
    Hybrid,
}

impl CodecTag {
    /// Every built-in tag.
    pub const ALL: [Self; 6] = [
        Self::UltraMinimal,
        Self::Delta,
        Self::Rle,
        Self::Bitmap,
        Self::QuadTree,
        Self::Hybrid,
    ];

    /// Wire name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::UltraMinimal => "ultraMinimal",
            Self::Delta => "delta",
            Self::Rle => "rle",
            Self::Bitmap => "bitmap",
            Self::QuadTree => "quadTree",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for CodecTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodecTag {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| CodecError::UnknownCodec(s.to_string()))
    }
}

/// Dimensions de la grille portées par le payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Width in cells.
    #[serde(alias = "w")]
    pub width: usize,
    /// Height in cells.
    #[serde(alias = "h")]
    pub height: usize,
    /// Opaque caller data, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl Metadata {
    /// Metadata without extra fields.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            extra: None,
        }
    }

    /// Metadata matching `grid`.
    #[must_use]
    pub fn of(grid: &Grid) -> Self {
        Self::new(grid.width(), grid.height())
    }

    /// Position index for these dimensions.
    ///
    /// # Errors
    /// Returns [`CodecError::MalformedMetadata`] if a dimension is zero.
    pub fn index(&self) -> Result<PositionIndex, CodecError> {
        Ok(PositionIndex::new(self.width, self.height)?)
    }

    /// Fresh blank grid sized from these dimensions.
    ///
    /// # Errors
    /// Returns [`CodecError::MalformedMetadata`] if a dimension is zero.
    pub fn blank_grid(&self) -> Result<Grid, CodecError> {
        Ok(Grid::blank(self.width, self.height)?)
    }
}

/// Enveloppe `{type, data, metadata}`.
///
/// `data` stays a JSON value until the registry hands it to the decoder
/// registered for `tag`, which parses its own shape.
///
/// # Example
/// ```
/// use ac_codec::payload::{CodecTag, TaggedPayload};
/// let json = r##"{"type":"ultraMinimal","data":{"#":[0]},"metadata":{"width":1,"height":1}}"##;
/// let payload: TaggedPayload = serde_json::from_str(json).unwrap();
/// assert_eq!(payload.tag, CodecTag::UltraMinimal);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaggedPayload {
    /// Codec that produced `data`.
    #[serde(rename = "type")]
    pub tag: CodecTag,
    /// Codec-specific payload.
    pub data: Value,
    /// Grid dimensions.
    pub metadata: Metadata,
}

/// Résultat d'un décodage : la grille, plus la couche couleur si présente.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    /// Decoded glyphs.
    pub grid: Grid,
    /// Decoded colors, if the payload carried any.
    pub colors: Option<ColorLayer>,
}

impl Decoded {
    /// Decoded grid without colors.
    #[must_use]
    pub fn plain(grid: Grid) -> Self {
        Self { grid, colors: None }
    }

    /// Fixed-width rows, for rendering collaborators.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.grid.to_lines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_serde_uses_wire_names() {
        for tag in CodecTag::ALL {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag.name()));
            assert_eq!(serde_json::from_str::<CodecTag>(&json).unwrap(), tag);
        }
    }

    #[test]
    fn unknown_tag_is_unknown_codec() {
        let err = "pattern".parse::<CodecTag>().unwrap_err();
        assert!(matches!(err, CodecError::UnknownCodec(name) if name == "pattern"));
    }

    #[test]
    fn metadata_accepts_short_field_names() {
        let meta: Metadata = serde_json::from_str(r#"{"w":4,"h":3}"#).unwrap();
        assert_eq!(meta, Metadata::new(4, 3));
    }

    #[test]
    fn zero_metadata_cannot_build_a_grid() {
        let err = Metadata::new(0, 3).blank_grid().unwrap_err();
        assert!(matches!(err, CodecError::MalformedMetadata(_)));
    }
}
