use ac_core::{ColorLayer, Grid};
use serde::Serialize;
use serde::de::{Deserialize, DeserializeOwned};
use serde_json::Value;

use crate::error::CodecError;
use crate::payload::{CodecTag, Decoded, Metadata, TaggedPayload};

/// Encode une grille dans le format d'un codec.
///
/// Implémenté par : `SparseCodec`, `DeltaCodec`, `RleCodec`, `BitmapCodec`,
/// `QuadTreeCodec`. Options (RLE mode, palette) live on the implementor.
///
/// # Example
/// ```
/// use ac_codec::traits::GridEncoder;
/// use ac_codec::sparse::SparseCodec;
/// use ac_core::Grid;
///
/// let grid = Grid::from_rows(&["# "]).unwrap();
/// let payload = SparseCodec::default().encode_payload(&grid, None).unwrap();
/// assert_eq!(payload.metadata.width, 2);
/// ```
pub trait GridEncoder {
    /// Tag written into the envelope.
    const TAG: CodecTag;

    /// Codec-specific payload.
    type Data: Serialize;

    /// Encode `grid` (and `colors` when the codec carries them).
    ///
    /// # Errors
    /// Codec-specific; see each implementor.
    fn encode(&self, grid: &Grid, colors: Option<&ColorLayer>) -> Result<Self::Data, CodecError>;

    /// Encode and wrap into a [`TaggedPayload`].
    ///
    /// # Errors
    /// Propagates [`GridEncoder::encode`] errors.
    fn encode_payload(
        &self,
        grid: &Grid,
        colors: Option<&ColorLayer>,
    ) -> Result<TaggedPayload, CodecError> {
        let data = serde_json::to_value(self.encode(grid, colors)?)?;
        Ok(TaggedPayload {
            tag: Self::TAG,
            data,
            metadata: Metadata::of(grid),
        })
    }
}

/// Reconstruit une grille à partir des données d'un codec.
///
/// CONTRAT : alloue toujours une grille neuve dimensionnée par `meta`.
/// Out-of-range positions are dropped, not fatal.
pub trait GridDecoder {
    /// Codec-specific payload.
    type Data: DeserializeOwned;

    /// Decode typed data.
    ///
    /// # Errors
    /// Returns an error if `meta` is malformed or `data` structurally unusable.
    fn decode(&self, data: &Self::Data, meta: &Metadata) -> Result<Decoded, CodecError>;

    /// Parse a raw JSON `data` field then decode it.
    ///
    /// # Errors
    /// Returns [`CodecError::MalformedPayload`] if `value` does not have the
    /// shape of [`GridDecoder::Data`].
    fn decode_value(&self, value: &Value, meta: &Metadata) -> Result<Decoded, CodecError> {
        let data = <Self::Data as Deserialize>::deserialize(value)?;
        self.decode(&data, meta)
    }
}
