//! Table `CodecTag → fonction de décodage` et dispatch d'encodage.

use std::collections::HashMap;

use ac_core::charset::PALETTE_AUTO;
use ac_core::{CodecConfig, ColorLayer, DEFAULT_MAX_CELLS, Grid};
use serde::Deserialize;
use serde_json::Value;

use crate::bitmap::{BitmapCodec, BitmapDecoder};
use crate::delta::DeltaCodec;
use crate::error::CodecError;
use crate::hybrid::{HybridData, decode_hybrid};
use crate::payload::{CodecTag, Decoded, Metadata, TaggedPayload};
use crate::quadtree::QuadTreeCodec;
use crate::rle::RleCodec;
use crate::sparse::SparseCodec;
use crate::traits::{GridDecoder, GridEncoder};
use crate::validate::normalize_with;

/// Signature d'un décodeur enregistré.
///
/// The registry is passed in so meta-codecs can resolve their sub-codecs.
pub type DecodeFn = fn(&DecoderRegistry, &Value, &Metadata) -> Result<Decoded, CodecError>;

fn decode_sparse(_: &DecoderRegistry, data: &Value, meta: &Metadata) -> Result<Decoded, CodecError> {
    SparseCodec::default().decode_value(data, meta)
}

fn decode_delta(_: &DecoderRegistry, data: &Value, meta: &Metadata) -> Result<Decoded, CodecError> {
    DeltaCodec::default().decode_value(data, meta)
}

fn decode_rle(_: &DecoderRegistry, data: &Value, meta: &Metadata) -> Result<Decoded, CodecError> {
    RleCodec::default().decode_value(data, meta)
}

fn decode_bitmap(_: &DecoderRegistry, data: &Value, meta: &Metadata) -> Result<Decoded, CodecError> {
    BitmapDecoder.decode_value(data, meta)
}

fn decode_quadtree(
    _: &DecoderRegistry,
    data: &Value,
    meta: &Metadata,
) -> Result<Decoded, CodecError> {
    QuadTreeCodec.decode_value(data, meta)
}

fn decode_hybrid_value(
    registry: &DecoderRegistry,
    data: &Value,
    meta: &Metadata,
) -> Result<Decoded, CodecError> {
    let data = HybridData::deserialize(data)?;
    decode_hybrid(registry, &data, meta)
}

/// Built-in decoder for every tag. Adding a tag fails to compile here.
fn builtin_decoder(tag: CodecTag) -> DecodeFn {
    match tag {
        CodecTag::UltraMinimal => decode_sparse,
        CodecTag::Delta => decode_delta,
        CodecTag::Rle => decode_rle,
        CodecTag::Bitmap => decode_bitmap,
        CodecTag::QuadTree => decode_quadtree,
        CodecTag::Hybrid => decode_hybrid_value,
    }
}

/// Registre des décodeurs.
///
/// # Example
/// ```
/// use ac_codec::registry::DecoderRegistry;
/// use serde_json::json;
///
/// let registry = DecoderRegistry::standard();
/// let payload = json!({
///     "type": "ultraMinimal",
///     "data": {"#": [0, 4, 8]},
///     "metadata": {"width": 3, "height": 3}
/// });
/// let decoded = registry.decode_value(&payload).unwrap();
/// assert_eq!(decoded.lines(), vec!["#  ", " # ", "  #"]);
/// ```
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: HashMap<CodecTag, DecodeFn>,
    max_cells: usize,
}

impl DecoderRegistry {
    /// Registry with no decoder at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
            max_cells: DEFAULT_MAX_CELLS,
        }
    }

    /// Registry with the six built-in decoders.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for tag in CodecTag::ALL {
            registry.register(tag, builtin_decoder(tag));
        }
        registry
    }

    /// Add or replace the decoder for `tag`.
    pub fn register(&mut self, tag: CodecTag, decode: DecodeFn) -> &mut Self {
        self.decoders.insert(tag, decode);
        self
    }

    /// This registry refusing grids of more than `max_cells` cells.
    #[must_use]
    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells.max(1);
        self
    }

    /// Largest grid area accepted, in cells.
    #[must_use]
    pub fn max_cells(&self) -> usize {
        self.max_cells
    }

    /// This registry minus `tag`.
    #[must_use]
    pub fn without(mut self, tag: CodecTag) -> Self {
        self.decoders.remove(&tag);
        self
    }

    /// Whether `tag` can be dispatched.
    #[must_use]
    pub fn supports(&self, tag: CodecTag) -> bool {
        self.decoders.contains_key(&tag)
    }

    /// Registered tags, in declaration order.
    #[must_use]
    pub fn tags(&self) -> Vec<CodecTag> {
        let mut tags: Vec<CodecTag> = self.decoders.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Dispatch raw `data` to the decoder registered for `tag`.
    ///
    /// # Errors
    /// Returns [`CodecError::UnknownCodec`] if `tag` is not registered,
    /// [`CodecError::MalformedMetadata`] if the area exceeds the cell limit,
    /// or the decoder's own error.
    pub fn decode_data(
        &self,
        tag: CodecTag,
        data: &Value,
        meta: &Metadata,
    ) -> Result<Decoded, CodecError> {
        let decode = self
            .decoders
            .get(&tag)
            .ok_or_else(|| CodecError::UnknownCodec(tag.name().to_string()))?;
        if meta
            .width
            .checked_mul(meta.height)
            .is_none_or(|cells| cells > self.max_cells)
        {
            return Err(CodecError::MalformedMetadata(format!(
                "{}×{} dépasse {} cellules",
                meta.width, meta.height, self.max_cells
            )));
        }
        log::debug!("Décodage {tag} ({}×{})", meta.width, meta.height);
        decode(self, data, meta)
    }

    /// Decode an already-normalized envelope.
    ///
    /// # Errors
    /// See [`DecoderRegistry::decode_data`].
    pub fn decode(&self, payload: &TaggedPayload) -> Result<Decoded, CodecError> {
        self.decode_data(payload.tag, &payload.data, &payload.metadata)
    }

    /// Validate, normalize, then decode a raw JSON payload.
    ///
    /// # Errors
    /// Returns the validation failure as a [`CodecError`], or the decode error.
    pub fn decode_value(&self, value: &Value) -> Result<Decoded, CodecError> {
        self.decode(&normalize_with(value, self.max_cells)?)
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("tags", &self.tags())
            .field("max_cells", &self.max_cells)
            .finish()
    }
}

/// Bitmap encoder configured from `config`.
fn bitmap_encoder(grid: &Grid, config: &CodecConfig) -> BitmapCodec {
    let mut codec = if config.bitmap_palette == PALETTE_AUTO {
        BitmapCodec::covering(grid)
    } else {
        BitmapCodec::new(config.palette())
    };
    codec.unknown = config.bitmap_unknown;
    codec
}

/// Encode `grid` with the codec named by `tag`, options taken from `config`.
///
/// # Example
/// ```
/// use ac_codec::payload::CodecTag;
/// use ac_codec::registry::encode_payload;
/// use ac_core::{CodecConfig, Grid};
///
/// let grid = Grid::from_rows(&["#  ", " # ", "  #"]).unwrap();
/// let payload = encode_payload(CodecTag::Delta, &grid, None, &CodecConfig::default()).unwrap();
/// assert_eq!(payload.data, serde_json::json!({"#": [0, 4, 4]}));
/// ```
///
/// # Errors
/// Returns [`CodecError::UnsupportedEncode`] for `hybrid`, or the encoder's
/// own error.
pub fn encode_payload(
    tag: CodecTag,
    grid: &Grid,
    colors: Option<&ColorLayer>,
    config: &CodecConfig,
) -> Result<TaggedPayload, CodecError> {
    let sparse = SparseCodec {
        with_colors: config.sparse_colors,
    };
    log::debug!("Encodage {tag} ({}×{})", grid.width(), grid.height());
    match tag {
        CodecTag::UltraMinimal => sparse.encode_payload(grid, colors),
        CodecTag::Delta => DeltaCodec { sparse }.encode_payload(grid, colors),
        CodecTag::Rle => RleCodec {
            mode: config.rle_mode,
        }
        .encode_payload(grid, colors),
        CodecTag::Bitmap => bitmap_encoder(grid, config).encode_payload(grid, colors),
        CodecTag::QuadTree => QuadTreeCodec.encode_payload(grid, colors),
        CodecTag::Hybrid => Err(CodecError::UnsupportedEncode(tag)),
    }
}
