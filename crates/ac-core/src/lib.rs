/// Grid model, position index and configuration for artcodec.
///
/// This crate contains the shared types every codec encodes from and
/// decodes into, plus the TOML configuration used by the front end.

pub mod charset;
pub mod color;
pub mod config;
pub mod error;
pub mod grid;
pub mod position;

pub use color::{CellColor, ColorLayer, NamedColor};
pub use config::CodecConfig;
pub use error::CoreError;
pub use grid::Grid;
pub use position::{DEFAULT_MAX_CELLS, PositionIndex};
