use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::resolve_palette;
use crate::position::DEFAULT_MAX_CELLS;

/// Configuration des codecs, chargeable depuis TOML.
///
/// Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use ac_core::config::{CodecConfig, RleMode};
/// let config = CodecConfig::default();
/// assert_eq!(config.rle_mode, RleMode::RowDelimited);
/// assert!(config.batch_parallel);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CodecConfig {
    // === RLE ===
    /// Marqueur de fin de ligne ou flux continu.
    pub rle_mode: RleMode,

    // === Bitmap ===
    /// Preset name ("compact", "standard", "blocks", "minimal"), "auto", or literal glyphs.
    pub bitmap_palette: String,
    /// What the bitmap encoder does with glyphs missing from the palette.
    pub bitmap_unknown: UnknownGlyph,

    // === Sparse ===
    /// Emit the color layer (compact `{w,h,c,p}` frame) when one is supplied.
    pub sparse_colors: bool,

    // === Batch / stream ===
    /// Décodage parallèle (rayon) des lots et animations.
    pub batch_parallel: bool,
    /// Taille max (octets) du reste non terminé d'un flux.
    pub stream_max_buffer: usize,

    // === Limits ===
    /// Nombre max de cellules (`width * height`) accepté au décodage.
    pub max_cells: usize,
}

/// Variante RLE.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum RleMode {
    /// Runs never cross a row; rows are separated by a `"\n"` marker run.
    #[default]
    RowDelimited,
    /// One run stream for the whole grid, re-split on `width`.
    Continuous,
}

/// Politique du codec bitmap pour un glyphe absent de la palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum UnknownGlyph {
    /// Use palette index 0 (lossy, logged).
    #[default]
    FirstEntry,
    /// Fail the encode with `IncompletePalette`.
    Reject,
}

/// Bornes du buffer de flux.
const STREAM_BUFFER_MIN: usize = 1024;
const STREAM_BUFFER_MAX: usize = 64 * 1024 * 1024;

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            rle_mode: RleMode::RowDelimited,
            bitmap_palette: "compact".to_string(),
            bitmap_unknown: UnknownGlyph::FirstEntry,
            sparse_colors: true,
            batch_parallel: true,
            stream_max_buffer: 1024 * 1024,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl CodecConfig {
    /// Clamp numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.stream_max_buffer = self
            .stream_max_buffer
            .clamp(STREAM_BUFFER_MIN, STREAM_BUFFER_MAX);
        self.max_cells = self.max_cells.max(1);
        if self.bitmap_palette.is_empty() {
            log::warn!("Palette bitmap vide, retour au preset 'compact'.");
            self.bitmap_palette = "compact".to_string();
        }
    }

    /// Palette résolue, un glyphe par entrée.
    ///
    /// # Example
    /// ```
    /// use ac_core::config::CodecConfig;
    /// let config = CodecConfig::default();
    /// assert_eq!(config.palette()[0], " ");
    /// ```
    #[must_use]
    pub fn palette(&self) -> Vec<String> {
        resolve_palette(&self.bitmap_palette)
    }
}

/// Structure TOML intermédiaire, toutes sections optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    rle: Option<RleSection>,
    bitmap: Option<BitmapSection>,
    sparse: Option<SparseSection>,
    batch: Option<BatchSection>,
    stream: Option<StreamSection>,
    limits: Option<LimitsSection>,
}

#[derive(Deserialize)]
struct RleSection {
    mode: Option<RleMode>,
}

#[derive(Deserialize)]
struct BitmapSection {
    palette: Option<String>,
    unknown: Option<UnknownGlyph>,
}

#[derive(Deserialize)]
struct SparseSection {
    colors: Option<bool>,
}

#[derive(Deserialize)]
struct BatchSection {
    parallel: Option<bool>,
}

#[derive(Deserialize)]
struct StreamSection {
    max_buffer: Option<usize>,
}

#[derive(Deserialize)]
struct LimitsSection {
    max_cells: Option<usize>,
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML for this schema.
///
/// # Example
/// ```
/// use ac_core::config::{parse_config, RleMode};
/// let config = parse_config("[rle]\nmode = \"Continuous\"\n").unwrap();
/// assert_eq!(config.rle_mode, RleMode::Continuous);
/// assert_eq!(config.bitmap_palette, "compact");
/// ```
pub fn parse_config(content: &str) -> Result<CodecConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = CodecConfig::default();

    if let Some(v) = file.rle.and_then(|s| s.mode) {
        config.rle_mode = v;
    }
    if let Some(b) = file.bitmap {
        if let Some(v) = b.palette {
            config.bitmap_palette = v;
        }
        if let Some(v) = b.unknown {
            config.bitmap_unknown = v;
        }
    }
    if let Some(v) = file.sparse.and_then(|s| s.colors) {
        config.sparse_colors = v;
    }
    if let Some(v) = file.batch.and_then(|s| s.parallel) {
        config.batch_parallel = v;
    }
    if let Some(v) = file.stream.and_then(|s| s.max_buffer) {
        config.stream_max_buffer = v;
    }
    if let Some(v) = file.limits.and_then(|s| s.max_cells) {
        config.max_cells = v;
    }

    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use ac_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<CodecConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide dans {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), CodecConfig::default());
    }

    #[test]
    fn shipped_default_toml_matches_defaults() {
        let shipped = include_str!("../../../config/default.toml");
        assert_eq!(parse_config(shipped).unwrap(), CodecConfig::default());
    }

    #[test]
    fn partial_sections_override_only_their_fields() {
        let config = parse_config(
            "[bitmap]\nunknown = \"Reject\"\n\n[batch]\nparallel = false\n",
        )
        .unwrap();
        assert_eq!(config.bitmap_unknown, UnknownGlyph::Reject);
        assert_eq!(config.bitmap_palette, "compact");
        assert!(!config.batch_parallel);
        assert!(config.sparse_colors);
    }

    #[test]
    fn stream_buffer_is_clamped() {
        let config = parse_config("[stream]\nmax_buffer = 3\n").unwrap();
        assert_eq!(config.stream_max_buffer, STREAM_BUFFER_MIN);
    }

    #[test]
    fn cell_limit_is_read_and_kept_positive() {
        let config = parse_config("[limits]\nmax_cells = 100\n").unwrap();
        assert_eq!(config.max_cells, 100);
        let config = parse_config("[limits]\nmax_cells = 0\n").unwrap();
        assert_eq!(config.max_cells, 1);
        assert_eq!(CodecConfig::default().max_cells, DEFAULT_MAX_CELLS);
    }

    #[test]
    fn empty_palette_falls_back_to_compact() {
        let config = parse_config("[bitmap]\npalette = \"\"\n").unwrap();
        assert_eq!(config.bitmap_palette, "compact");
    }

    #[test]
    fn unknown_enum_value_is_an_error() {
        assert!(parse_config("[rle]\nmode = \"Zigzag\"\n").is_err());
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sparse]\ncolors = false").unwrap();
        let config = load_config(file.path()).unwrap();
        assert!(!config.sparse_colors);
    }

    #[test]
    fn load_config_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("absent.toml")).is_err());
    }
}
