/// Lossless codecs for character-art grids.
///
/// Six formats (`ultraMinimal`, `delta`, `rle`, `bitmap`, `quadTree`,
/// `hybrid`) behind one tagged `{type, data, metadata}` envelope, plus the
/// registry, validator, batch and streaming decoders built on it.

pub mod analyze;
pub mod batch;
pub mod bitmap;
pub mod delta;
pub mod error;
pub mod hybrid;
pub mod payload;
pub mod quadtree;
pub mod registry;
pub mod rle;
pub mod sparse;
pub mod stream;
pub mod traits;
pub mod validate;

pub use error::CodecError;
pub use payload::{CodecTag, Decoded, Metadata, TaggedPayload};
pub use registry::{DecoderRegistry, encode_payload};
pub use traits::{GridDecoder, GridEncoder};
pub use validate::{Validation, normalize, normalize_with, validate, validate_with};
