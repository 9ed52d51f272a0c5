//! Comparaison de taille entre codecs pour une grille donnée.

use ac_core::{CodecConfig, Grid};
use serde::Serialize;

use crate::error::CodecError;
use crate::payload::CodecTag;
use crate::registry::{DecoderRegistry, encode_payload};

/// Ligne du rapport pour un codec.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompressionReport {
    /// Codec measured.
    pub codec: CodecTag,
    /// Serialized `data` size in bytes.
    pub size: usize,
    /// `size / original * 100`, where `original` is the JSON row list size.
    pub ratio: f64,
    /// Whether decoding gives back the exact grid.
    pub lossless: bool,
}

/// Encode `grid` with every encodable codec and measure the `data` field.
///
/// The bitmap palette and RLE variant come from `config`.
///
/// # Example
/// ```
/// use ac_codec::analyze::{analyze, best};
/// use ac_codec::payload::CodecTag;
/// use ac_core::{CodecConfig, Grid};
///
/// let mut rows = vec![" ".repeat(40); 20];
/// rows[3].replace_range(5..6, "#");
/// let grid = Grid::from_rows(&rows).unwrap();
/// let report = analyze(&grid, &CodecConfig::default()).unwrap();
/// assert_eq!(report.len(), 5);
/// assert!(best(&report).unwrap().ratio < 5.0);
/// ```
///
/// # Errors
/// Returns the first encoder error (for example a strict bitmap palette
/// that does not cover the grid).
pub fn analyze(grid: &Grid, config: &CodecConfig) -> Result<Vec<CompressionReport>, CodecError> {
    let original = serde_json::to_string(&grid.to_lines())?.len().max(1);
    let registry = DecoderRegistry::standard();

    CodecTag::ALL
        .into_iter()
        .filter(|tag| *tag != CodecTag::Hybrid)
        .map(|codec| -> Result<CompressionReport, CodecError> {
            let payload = encode_payload(codec, grid, None, config)?;
            let size = serde_json::to_string(&payload.data)?.len();
            let lossless = registry
                .decode(&payload)
                .is_ok_and(|decoded| decoded.grid == *grid);
            Ok(CompressionReport {
                codec,
                size,
                ratio: size as f64 / original as f64 * 100.0,
                lossless,
            })
        })
        .collect()
}

/// Smallest lossless entry, falling back to the smallest overall.
#[must_use]
pub fn best(reports: &[CompressionReport]) -> Option<&CompressionReport> {
    reports
        .iter()
        .filter(|r| r.lossless)
        .min_by_key(|r| r.size)
        .or_else(|| reports.iter().min_by_key(|r| r.size))
}

#[cfg(test)]
mod tests {
    use ac_core::config::UnknownGlyph;

    use super::*;

    fn report_for(reports: &[CompressionReport], codec: CodecTag) -> &CompressionReport {
        reports.iter().find(|r| r.codec == codec).unwrap()
    }

    #[test]
    fn ratio_is_relative_to_row_json() {
        let grid = Grid::from_rows(&["#  ", " # ", "  #"]).unwrap();
        let reports = analyze(&grid, &CodecConfig::default()).unwrap();
        let original = r##"["#  "," # ","  #"]"##.len() as f64;
        let sparse = report_for(&reports, CodecTag::UltraMinimal);
        assert_eq!(sparse.size, r##"{"#":[0,4,8]}"##.len());
        assert!((sparse.ratio - sparse.size as f64 / original * 100.0).abs() < 1e-9);
    }

    #[test]
    fn lossy_palette_is_flagged() {
        let grid = Grid::from_rows(&["愛愛", "  "]).unwrap();
        let reports = analyze(&grid, &CodecConfig::default()).unwrap();
        assert!(!report_for(&reports, CodecTag::Bitmap).lossless);
        assert!(report_for(&reports, CodecTag::Rle).lossless);
        assert_ne!(best(&reports).unwrap().codec, CodecTag::Bitmap);
    }

    #[test]
    fn strict_palette_error_propagates() {
        let config = CodecConfig {
            bitmap_unknown: UnknownGlyph::Reject,
            ..CodecConfig::default()
        };
        let grid = Grid::from_rows(&["愛"]).unwrap();
        assert!(matches!(
            analyze(&grid, &config),
            Err(CodecError::IncompletePalette(_))
        ));
    }

    #[test]
    fn best_of_nothing_is_none() {
        assert!(best(&[]).is_none());
    }
}
