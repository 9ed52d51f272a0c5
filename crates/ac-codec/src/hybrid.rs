//! `hybrid` : deux sous-payloads composés par un masque booléen.
//!
//! Both halves are decoded through the registry into full grids, then
//! `mask[r][c] == true` selects the second grid's cell. A missing, short or
//! ragged mask selects the first grid. There is no hybrid encoder.

use ac_core::{ColorLayer, Grid};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodecError;
use crate::payload::{CodecTag, Decoded, Metadata};
use crate::registry::DecoderRegistry;

/// Données `hybrid`.
///
/// # Example
/// ```
/// use ac_codec::hybrid::HybridData;
/// let json = r#"{"method1":"rle","data1":[],"method2":"rle","data2":[]}"#;
/// let data: HybridData = serde_json::from_str(json).unwrap();
/// assert!(data.mask.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HybridData {
    /// Tag of the first sub-payload.
    pub method1: String,
    /// First sub-payload `data`.
    pub data1: Value,
    /// Tag of the second sub-payload.
    pub method2: String,
    /// Second sub-payload `data`.
    pub data2: Value,
    /// Row-major selection mask; `true` picks the second grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<Vec<bool>>>,
}

fn picks_second(mask: Option<&[Vec<bool>]>, row: usize, col: usize) -> bool {
    mask.and_then(|m| m.get(row))
        .and_then(|r| r.get(col))
        .copied()
        .unwrap_or(false)
}

/// Cell-by-cell composition of two equally sized grids.
///
/// # Example
/// ```
/// use ac_codec::hybrid::compose;
/// use ac_core::Grid;
/// let a = Grid::from_rows(&["AB", "CD"]).unwrap();
/// let b = Grid::from_rows(&["ab", "cd"]).unwrap();
/// let mask = vec![vec![false, true], vec![true, false]];
/// assert_eq!(compose(&a, &b, Some(&mask)).to_lines(), vec!["Ab", "cD"]);
/// ```
#[must_use]
pub fn compose(first: &Grid, second: &Grid, mask: Option<&[Vec<bool>]>) -> Grid {
    let mut out = first.clone();
    for row in 0..out.height() {
        for col in 0..out.width() {
            if picks_second(mask, row, col) {
                if let Some(glyph) = second.get(row, col) {
                    out.set_at(row, col, glyph);
                }
            }
        }
    }
    out
}

fn compose_colors(
    first: Option<&ColorLayer>,
    second: Option<&ColorLayer>,
    mask: Option<&[Vec<bool>]>,
    meta: &Metadata,
) -> Result<Option<ColorLayer>, CodecError> {
    if first.is_none() && second.is_none() {
        return Ok(None);
    }
    let index = meta.index()?;
    let mut layer = ColorLayer::new(meta.width, meta.height)?;
    for pos in 0..index.len() {
        let (row, col) = index.row_col_of(pos);
        let side = if picks_second(mask, row, col) { second } else { first };
        if let Some(color) = side.and_then(|l| l.get(row, col)) {
            layer.set(pos, color);
        }
    }
    Ok(Some(layer))
}

fn decode_half(
    registry: &DecoderRegistry,
    method: &str,
    data: &Value,
    meta: &Metadata,
) -> Result<Decoded, CodecError> {
    let tag: CodecTag = method.parse()?;
    if tag == CodecTag::Hybrid {
        return Err(CodecError::MalformedPayload(
            "hybrid imbriqué non supporté".to_string(),
        ));
    }
    registry.decode_data(tag, data, meta)
}

/// Decode both halves and compose them.
///
/// # Errors
/// Returns [`CodecError::UnknownCodec`] if a `method` is not registered, or
/// the error of either sub-decode.
pub fn decode_hybrid(
    registry: &DecoderRegistry,
    data: &HybridData,
    meta: &Metadata,
) -> Result<Decoded, CodecError> {
    let first = decode_half(registry, &data.method1, &data.data1, meta)?;
    let second = decode_half(registry, &data.method2, &data.data2, meta)?;
    let mask = data.mask.as_deref();

    if let Some(m) = mask {
        if m.len() < meta.height || m.iter().any(|r| r.len() < meta.width) {
            log::warn!("Masque hybride incomplet, cellules manquantes prises dans la grille 1");
        }
    }

    let colors = compose_colors(first.colors.as_ref(), second.colors.as_ref(), mask, meta)?;
    Ok(Decoded {
        grid: compose(&first.grid, &second.grid, mask),
        colors,
    })
}

#[cfg(test)]
mod tests {
    use ac_core::CellColor;
    use serde_json::json;

    use super::*;

    fn halves() -> (Value, Value) {
        (
            json!({"A": [0], "B": [1], "C": [2], "D": [3]}),
            json!({"a": [0], "b": [1], "c": [2], "d": [3]}),
        )
    }

    fn hybrid(mask: Option<Value>) -> HybridData {
        let (data1, data2) = halves();
        let mut value = json!({
            "method1": "ultraMinimal", "data1": data1,
            "method2": "ultraMinimal", "data2": data2,
        });
        if let Some(m) = mask {
            value["mask"] = m;
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn mask_selects_second_grid() {
        let data = hybrid(Some(json!([[false, true], [true, false]])));
        let decoded = decode_hybrid(&DecoderRegistry::standard(), &data, &Metadata::new(2, 2)).unwrap();
        assert_eq!(decoded.lines(), vec!["Ab", "cD"]);
    }

    #[test]
    fn missing_mask_is_first_grid() {
        let decoded =
            decode_hybrid(&DecoderRegistry::standard(), &hybrid(None), &Metadata::new(2, 2)).unwrap();
        assert_eq!(decoded.lines(), vec!["AB", "CD"]);
    }

    #[test]
    fn ragged_mask_defaults_to_first_grid() {
        let data = hybrid(Some(json!([[true]])));
        let decoded = decode_hybrid(&DecoderRegistry::standard(), &data, &Metadata::new(2, 2)).unwrap();
        assert_eq!(decoded.lines(), vec!["aB", "CD"]);
    }

    #[test]
    fn halves_may_use_different_codecs() {
        let data: HybridData = serde_json::from_value(json!({
            "method1": "rle", "data1": [["#", 4]],
            "method2": "quadTree", "data2": {"tl": null, "tr": "@", "bl": null, "br": null},
            "mask": [[true, true], [true, true]],
        }))
        .unwrap();
        let decoded = decode_hybrid(&DecoderRegistry::standard(), &data, &Metadata::new(2, 2)).unwrap();
        assert_eq!(decoded.lines(), vec![" @", "  "]);
    }

    #[test]
    fn unknown_method_is_unknown_codec() {
        let mut data = hybrid(None);
        data.method2 = "pattern".into();
        let err = decode_hybrid(&DecoderRegistry::standard(), &data, &Metadata::new(2, 2)).unwrap_err();
        assert!(matches!(err, CodecError::UnknownCodec(name) if name == "pattern"));
    }

    #[test]
    fn colors_follow_the_selected_side() {
        let data: HybridData = serde_json::from_value(json!({
            "method1": "ultraMinimal", "data1": {"w": 2, "h": 1, "c": {"#": [0, 1]}, "p": {"red": [0, 1]}},
            "method2": "ultraMinimal", "data2": {"@": [1]},
            "mask": [[false, true]],
        }))
        .unwrap();
        let decoded = decode_hybrid(&DecoderRegistry::standard(), &data, &Metadata::new(2, 1)).unwrap();
        assert_eq!(decoded.lines(), vec!["#@"]);
        let colors = decoded.colors.unwrap();
        assert_eq!(colors.get(0, 0), Some("red".parse::<CellColor>().unwrap()));
        assert_eq!(colors.get(0, 1), None);
    }
}
