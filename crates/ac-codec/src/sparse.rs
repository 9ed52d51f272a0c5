//! `ultraMinimal` : glyphe → positions linéaires.
//!
//! Blank cells are never recorded, which is where backgrounds compress.

use std::collections::BTreeMap;

use ac_core::charset::BLANK;
use ac_core::{CellColor, ColorLayer, Grid};
use serde::{Deserialize, Serialize, Serializer};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::CodecError;
use crate::payload::{CodecTag, Decoded, Metadata};
use crate::traits::{GridDecoder, GridEncoder};

/// Glyph (or color key) → ascending linear positions.
pub type PositionMap = BTreeMap<String, Vec<usize>>;

/// Données canoniques des codecs creux (`ultraMinimal`, `delta`).
///
/// Serialises as a plain map when there is no color layer, otherwise as the
/// compact frame `{w, h, c, p}`. Deserialises from the plain map, the compact
/// frame, the legacy `{dimensions, charPositions, colors}` frame, and the
/// `"#:0,4,8;@:9"` string form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SparseRepr")]
pub struct SparseData {
    /// Glyph positions.
    pub chars: PositionMap,
    /// Color-key positions.
    pub colors: Option<PositionMap>,
    /// `(width, height)` when the data carried its own dimensions.
    pub dims: Option<(usize, usize)>,
}

#[derive(Serialize)]
struct CompactRef<'a> {
    w: usize,
    h: usize,
    c: &'a PositionMap,
    p: &'a PositionMap,
}

impl Serialize for SparseData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (&self.colors, self.dims) {
            (Some(p), Some((w, h))) => CompactRef {
                w,
                h,
                c: &self.chars,
                p,
            }
            .serialize(serializer),
            _ => self.chars.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
struct LegacyDimensions {
    width: usize,
    height: usize,
}

/// Formes acceptées sur le fil, dans l'ordre d'essai.
#[derive(Deserialize)]
#[serde(untagged)]
enum SparseRepr {
    Legacy {
        dimensions: LegacyDimensions,
        #[serde(rename = "charPositions")]
        char_positions: PositionMap,
        #[serde(default)]
        colors: Option<PositionMap>,
    },
    Compact {
        w: usize,
        h: usize,
        c: PositionMap,
        #[serde(default)]
        p: Option<PositionMap>,
    },
    Text(String),
    Plain(PositionMap),
}

impl TryFrom<SparseRepr> for SparseData {
    type Error = CodecError;

    fn try_from(repr: SparseRepr) -> Result<Self, Self::Error> {
        Ok(match repr {
            SparseRepr::Legacy {
                dimensions,
                char_positions,
                colors,
            } => Self {
                chars: char_positions,
                colors,
                dims: Some((dimensions.width, dimensions.height)),
            },
            SparseRepr::Compact { w, h, c, p } => Self {
                chars: c,
                colors: p,
                dims: Some((w, h)),
            },
            SparseRepr::Text(text) => Self {
                chars: parse_position_string(&text)?,
                ..Self::default()
            },
            SparseRepr::Plain(chars) => Self {
                chars,
                ..Self::default()
            },
        })
    }
}

/// Positions of every non-blank glyph, in scan order.
///
/// # Example
/// ```
/// use ac_codec::sparse::position_map;
/// use ac_core::Grid;
/// let grid = Grid::from_rows(&["#  ", " # ", "  #"]).unwrap();
/// assert_eq!(position_map(&grid)["#"], vec![0, 4, 8]);
/// ```
#[must_use]
pub fn position_map(grid: &Grid) -> PositionMap {
    let mut map = PositionMap::new();
    for (pos, glyph) in grid.iter() {
        if glyph != BLANK {
            map.entry(glyph.to_string()).or_default().push(pos);
        }
    }
    map
}

/// Positions of every explicitly colored cell, keyed by color key.
#[must_use]
pub fn color_position_map(layer: &ColorLayer) -> PositionMap {
    let mut map = PositionMap::new();
    for (pos, color) in layer.iter() {
        map.entry(color.key()).or_default().push(pos);
    }
    map
}

/// Écrit chaque glyphe à ses positions. Returns the number of dropped entries.
pub fn fill_glyphs(grid: &mut Grid, chars: &PositionMap) -> usize {
    let mut dropped = 0;
    for (glyph, positions) in chars {
        if glyph.is_empty() {
            dropped += positions.len();
            continue;
        }
        dropped += positions.iter().filter(|&&pos| !grid.set(pos, glyph)).count();
    }
    dropped
}

/// Same as [`fill_glyphs`] for color keys. Unparseable keys count as dropped.
pub fn fill_colors(layer: &mut ColorLayer, colors: &PositionMap) -> usize {
    let mut dropped = 0;
    for (key, positions) in colors {
        match key.parse::<CellColor>() {
            Ok(color) => {
                dropped += positions.iter().filter(|&&pos| !layer.set(pos, color)).count();
            }
            Err(e) => {
                log::warn!("Couleur ignorée : {e}");
                dropped += positions.len();
            }
        }
    }
    dropped
}

/// Rebuild a grid (and color layer) from absolute positions.
///
/// # Errors
/// Returns [`CodecError::MalformedMetadata`] if `meta` has a zero dimension.
pub fn fill(data: &SparseData, meta: &Metadata) -> Result<Decoded, CodecError> {
    let mut grid = meta.blank_grid()?;
    let dropped = fill_glyphs(&mut grid, &data.chars);
    if dropped > 0 {
        log::warn!(
            "{dropped} position(s) hors de {}×{} ignorée(s)",
            meta.width,
            meta.height
        );
    }

    let colors = match &data.colors {
        Some(map) => {
            let mut layer = ColorLayer::new(meta.width, meta.height)?;
            let dropped = fill_colors(&mut layer, map);
            if dropped > 0 {
                log::warn!("{dropped} position(s) couleur ignorée(s)");
            }
            Some(layer)
        }
        None => None,
    };
    Ok(Decoded { grid, colors })
}

/// Format compact texte : `"#:0,4,8;@:9"`.
///
/// # Example
/// ```
/// use ac_codec::sparse::{parse_position_string, to_position_string, PositionMap};
/// let mut map = PositionMap::new();
/// map.insert("#".into(), vec![0, 4, 8]);
/// map.insert(";".into(), vec![2]);
/// let text = to_position_string(&map);
/// assert_eq!(text, "#:0,4,8;;:2");
/// assert_eq!(parse_position_string(&text).unwrap(), map);
/// ```
#[must_use]
pub fn to_position_string(map: &PositionMap) -> String {
    let mut out = String::new();
    for (i, (glyph, positions)) in map.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        out.push_str(glyph);
        out.push(':');
        let list: Vec<String> = positions.iter().map(ToString::to_string).collect();
        out.push_str(&list.join(","));
    }
    out
}

/// Parse the `"#:0,4,8;@:9"` form.
///
/// The key is always exactly one grapheme, so `:` `;` and `,` are valid keys.
///
/// # Errors
/// Returns [`CodecError::MalformedPayload`] on a missing `:` or a bad number.
pub fn parse_position_string(text: &str) -> Result<PositionMap, CodecError> {
    let mut map = PositionMap::new();
    let mut rest = text;
    while let Some(key) = rest.graphemes(true).next() {
        rest = rest[key.len()..]
            .strip_prefix(':')
            .ok_or_else(|| CodecError::MalformedPayload(format!("':' attendu après {key:?}")))?;
        let end = rest.find(';').unwrap_or(rest.len());
        let positions = map.entry(key.to_string()).or_default();
        for item in rest[..end].split(',').filter(|s| !s.is_empty()) {
            let pos = item
                .trim()
                .parse()
                .map_err(|_| CodecError::MalformedPayload(format!("position invalide {item:?}")))?;
            positions.push(pos);
        }
        rest = rest.get(end + 1..).unwrap_or("");
    }
    Ok(map)
}

/// Codec `ultraMinimal`.
#[derive(Clone, Copy, Debug)]
pub struct SparseCodec {
    /// Emit the compact `{w,h,c,p}` frame when a color layer is supplied.
    pub with_colors: bool,
}

impl Default for SparseCodec {
    fn default() -> Self {
        Self { with_colors: true }
    }
}

impl SparseCodec {
    pub(crate) fn sparse_data(
        self,
        grid: &Grid,
        colors: Option<&ColorLayer>,
    ) -> Result<SparseData, CodecError> {
        let colors = match colors {
            Some(layer) if self.with_colors => {
                layer.check_shape(grid)?;
                Some(color_position_map(layer))
            }
            _ => None,
        };
        Ok(SparseData {
            chars: position_map(grid),
            colors,
            dims: Some((grid.width(), grid.height())),
        })
    }
}

impl GridEncoder for SparseCodec {
    const TAG: CodecTag = CodecTag::UltraMinimal;
    type Data = SparseData;

    fn encode(&self, grid: &Grid, colors: Option<&ColorLayer>) -> Result<SparseData, CodecError> {
        self.sparse_data(grid, colors)
    }
}

impl GridDecoder for SparseCodec {
    type Data = SparseData;

    fn decode(&self, data: &SparseData, meta: &Metadata) -> Result<Decoded, CodecError> {
        fill(data, meta)
    }
}

#[cfg(test)]
mod tests {
    use ac_core::NamedColor;
    use serde_json::json;

    use super::*;

    fn diagonal() -> Grid {
        Grid::from_rows(&["#  ", " # ", "  #"]).unwrap()
    }

    #[test]
    fn diagonal_encodes_to_single_key() {
        let data = SparseCodec::default().encode(&diagonal(), None).unwrap();
        assert_eq!(serde_json::to_value(&data).unwrap(), json!({"#": [0, 4, 8]}));
    }

    #[test]
    fn roundtrip_exact() {
        let grid = Grid::from_rows(&["つの愛 ", "  @@ .", "#"]).unwrap();
        let codec = SparseCodec::default();
        let data = codec.encode(&grid, None).unwrap();
        let decoded = codec.decode(&data, &Metadata::of(&grid)).unwrap();
        assert_eq!(decoded.grid, grid);
        assert!(decoded.colors.is_none());
    }

    #[test]
    fn all_blank_grid_is_empty_map() {
        let grid = Grid::blank(4, 3).unwrap();
        let codec = SparseCodec::default();
        let data = codec.encode(&grid, None).unwrap();
        assert!(data.chars.is_empty());
        let decoded = codec.decode(&data, &Metadata::new(4, 3)).unwrap();
        assert_eq!(decoded.grid, grid);
    }

    #[test]
    fn out_of_range_positions_are_dropped() {
        let data: SparseData = serde_json::from_value(json!({"#": [0, 9, 100], "@": [3]})).unwrap();
        let decoded = fill(&data, &Metadata::new(3, 3)).unwrap();
        assert_eq!(decoded.lines(), vec!["#  ", "@  ", "   "]);
    }

    #[test]
    fn compact_frame_carries_colors() {
        let grid = diagonal();
        let mut layer = ColorLayer::new(3, 3).unwrap();
        layer.set(0, CellColor::Rgb(255, 0, 0));
        layer.set(8, CellColor::Named(NamedColor::Green));

        let codec = SparseCodec::default();
        let data = codec.encode(&grid, Some(&layer)).unwrap();
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(
            value,
            json!({"w": 3, "h": 3, "c": {"#": [0, 4, 8]}, "p": {"255,0,0": [0], "green": [8]}})
        );

        let back: SparseData = serde_json::from_value(value).unwrap();
        let decoded = codec.decode(&back, &Metadata::new(3, 3)).unwrap();
        assert_eq!(decoded.grid, grid);
        assert_eq!(decoded.colors, Some(layer));
    }

    #[test]
    fn colors_are_skipped_when_disabled() {
        let grid = diagonal();
        let layer = ColorLayer::new(3, 3).unwrap();
        let data = SparseCodec { with_colors: false }.encode(&grid, Some(&layer)).unwrap();
        assert!(data.colors.is_none());
    }

    #[test]
    fn mismatched_color_layer_is_rejected() {
        let layer = ColorLayer::new(2, 2).unwrap();
        assert!(SparseCodec::default().encode(&diagonal(), Some(&layer)).is_err());
    }

    #[test]
    fn legacy_frame_is_accepted() {
        let value = json!({
            "dimensions": {"width": 2, "height": 1},
            "charset": "#",
            "charPositions": {"#": [1]},
            "colors": {"7": [1], "not-a-color": [0]}
        });
        let data: SparseData = serde_json::from_value(value).unwrap();
        assert_eq!(data.dims, Some((2, 1)));
        let decoded = fill(&data, &Metadata::new(2, 1)).unwrap();
        assert_eq!(decoded.lines(), vec![" #"]);
        let layer = decoded.colors.unwrap();
        assert_eq!(layer.get(0, 1), Some(CellColor::Indexed(7)));
        assert_eq!(layer.get(0, 0), None);
    }

    #[test]
    fn string_form_is_accepted() {
        let data: SparseData = serde_json::from_value(json!("つ:0,2;::1")).unwrap();
        let decoded = fill(&data, &Metadata::new(3, 1)).unwrap();
        assert_eq!(decoded.lines(), vec!["つ:つ"]);
    }

    #[test]
    fn string_form_errors() {
        assert!(parse_position_string("#0,1").is_err());
        assert!(parse_position_string("#:0,x").is_err());
        assert!(parse_position_string("").unwrap().is_empty());
    }

    #[test]
    fn negative_position_is_malformed() {
        assert!(serde_json::from_value::<SparseData>(json!({"#": [-1]})).is_err());
    }
}
