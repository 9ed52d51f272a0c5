//! `quadTree` : découpage récursif en quadrants uniformes.
//!
//! A uniform region collapses to one leaf (`null` when blank). Otherwise the
//! rectangle `(x, y, w, h)` splits at `ceil(w/2)`, `ceil(h/2)`: top-left takes
//! the ceiling share, right and bottom children take the remainder, which may
//! be empty at grid edges.

use ac_core::charset::BLANK;
use ac_core::{ColorLayer, Grid};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::payload::{CodecTag, Decoded, Metadata};
use crate::traits::{GridDecoder, GridEncoder};

/// Nœud de l'arbre.
///
/// Wire form: `null`, a glyph string, or `{"tl", "tr", "bl", "br"}`.
///
/// # Example
/// ```
/// use ac_codec::quadtree::QuadNode;
/// let node: QuadNode = serde_json::from_str(r##"{"tl":"#","tr":null,"bl":null,"br":"#"}"##).unwrap();
/// assert!(matches!(node, QuadNode::Node { .. }));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuadNode {
    /// Uniformly blank region.
    #[default]
    Empty,
    /// Uniform region of one glyph.
    Leaf(String),
    /// Split region.
    Node {
        /// Top-left.
        #[serde(default)]
        tl: Box<QuadNode>,
        /// Top-right.
        #[serde(default)]
        tr: Box<QuadNode>,
        /// Bottom-left.
        #[serde(default)]
        bl: Box<QuadNode>,
        /// Bottom-right.
        #[serde(default)]
        br: Box<QuadNode>,
    },
}

/// Rectangle `(x, y, w, h)` en cellules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Rect {
    x: usize,
    y: usize,
    w: usize,
    h: usize,
}

impl Rect {
    /// `[tl, tr, bl, br]`, ceiling share to the top-left.
    fn quadrants(self) -> [Rect; 4] {
        let hw = self.w.div_ceil(2);
        let hh = self.h.div_ceil(2);
        let (x, y) = (self.x, self.y);
        [
            Rect { x, y, w: hw, h: hh },
            Rect { x: x + hw, y, w: self.w - hw, h: hh },
            Rect { x, y: y + hh, w: hw, h: self.h - hh },
            Rect { x: x + hw, y: y + hh, w: self.w - hw, h: self.h - hh },
        ]
    }

    fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// The glyph filling `rect` if the region is uniform.
fn uniform_glyph(grid: &Grid, rect: Rect) -> Option<&str> {
    let first = grid.get(rect.y, rect.x)?;
    for row in rect.y..rect.y + rect.h {
        for col in rect.x..rect.x + rect.w {
            if grid.get(row, col) != Some(first) {
                return None;
            }
        }
    }
    Some(first)
}

fn build(grid: &Grid, rect: Rect) -> QuadNode {
    if rect.is_empty() {
        return QuadNode::Empty;
    }
    if let Some(glyph) = uniform_glyph(grid, rect) {
        return if glyph == BLANK {
            QuadNode::Empty
        } else {
            QuadNode::Leaf(glyph.to_string())
        };
    }
    let [tl, tr, bl, br] = rect.quadrants().map(|q| Box::new(build(grid, q)));
    QuadNode::Node { tl, tr, bl, br }
}

/// Build the tree for the whole grid.
///
/// # Example
/// ```
/// use ac_codec::quadtree::{encode_tree, QuadNode};
/// use ac_core::Grid;
/// assert_eq!(encode_tree(&Grid::blank(5, 3).unwrap()), QuadNode::Empty);
/// assert_eq!(encode_tree(&Grid::from_rows(&["@@", "@@"]).unwrap()), QuadNode::Leaf("@".into()));
/// ```
#[must_use]
pub fn encode_tree(grid: &Grid) -> QuadNode {
    build(
        grid,
        Rect {
            x: 0,
            y: 0,
            w: grid.width(),
            h: grid.height(),
        },
    )
}

/// Écrit l'arbre dans `grid`; les feuilles sont bornées à la grille.
fn paint(grid: &mut Grid, node: &QuadNode, rect: Rect) {
    if rect.is_empty() {
        return;
    }
    match node {
        QuadNode::Empty => {}
        QuadNode::Leaf(glyph) => {
            if glyph.is_empty() {
                return;
            }
            let rows = rect.y..(rect.y + rect.h).min(grid.height());
            let cols = rect.x..(rect.x + rect.w).min(grid.width());
            for row in rows {
                for col in cols.clone() {
                    grid.set_at(row, col, glyph);
                }
            }
        }
        QuadNode::Node { tl, tr, bl, br } => {
            let [q_tl, q_tr, q_bl, q_br] = rect.quadrants();
            paint(grid, tl, q_tl);
            paint(grid, tr, q_tr);
            paint(grid, bl, q_bl);
            paint(grid, br, q_br);
        }
    }
}

/// Decode a tree into a fresh `meta`-sized grid.
///
/// # Errors
/// Returns [`CodecError::MalformedMetadata`] if `meta` has a zero dimension.
pub fn decode_tree(tree: &QuadNode, meta: &Metadata) -> Result<Grid, CodecError> {
    let mut grid = meta.blank_grid()?;
    paint(
        &mut grid,
        tree,
        Rect {
            x: 0,
            y: 0,
            w: meta.width,
            h: meta.height,
        },
    );
    Ok(grid)
}

/// Codec `quadTree`.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuadTreeCodec;

impl GridEncoder for QuadTreeCodec {
    const TAG: CodecTag = CodecTag::QuadTree;
    type Data = QuadNode;

    fn encode(&self, grid: &Grid, _colors: Option<&ColorLayer>) -> Result<QuadNode, CodecError> {
        Ok(encode_tree(grid))
    }
}

impl GridDecoder for QuadTreeCodec {
    type Data = QuadNode;

    fn decode(&self, data: &QuadNode, meta: &Metadata) -> Result<Decoded, CodecError> {
        decode_tree(data, meta).map(Decoded::plain)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn roundtrip(grid: &Grid) -> Grid {
        let value = serde_json::to_value(encode_tree(grid)).unwrap();
        let tree: QuadNode = serde_json::from_value(value).unwrap();
        decode_tree(&tree, &Metadata::of(grid)).unwrap()
    }

    #[test]
    fn quadrants_give_ceiling_to_top_left() {
        let q = Rect { x: 0, y: 0, w: 5, h: 3 }.quadrants();
        assert_eq!(q[0], Rect { x: 0, y: 0, w: 3, h: 2 });
        assert_eq!(q[1], Rect { x: 3, y: 0, w: 2, h: 2 });
        assert_eq!(q[2], Rect { x: 0, y: 2, w: 3, h: 1 });
        assert_eq!(q[3], Rect { x: 3, y: 2, w: 2, h: 1 });
        let q = Rect { x: 4, y: 0, w: 1, h: 2 }.quadrants();
        assert!(q[1].is_empty() && q[3].is_empty());
    }

    #[test]
    fn non_power_of_two_roundtrip() {
        let grids = [
            Grid::from_rows(&["#  @#", " #@  ", "  #.."]).unwrap(),
            Grid::from_rows(&["abcdefg"]).unwrap(),
            Grid::from_rows(&["a", "b", "c"]).unwrap(),
            Grid::from_rows(&["x"]).unwrap(),
            Grid::blank(7, 5).unwrap(),
            Grid::from_rows(&["つの愛", "愛の ", "   "]).unwrap(),
        ];
        for grid in &grids {
            assert_eq!(&roundtrip(grid), grid);
        }
    }

    #[test]
    fn wire_form_uses_null_for_blank() {
        let grid = Grid::from_rows(&["# ", " #"]).unwrap();
        assert_eq!(
            serde_json::to_value(encode_tree(&grid)).unwrap(),
            json!({"tl": "#", "tr": null, "bl": null, "br": "#"})
        );
    }

    #[test]
    fn missing_children_are_empty() {
        let tree: QuadNode = serde_json::from_value(json!({"br": "@"})).unwrap();
        let grid = decode_tree(&tree, &Metadata::new(2, 2)).unwrap();
        assert_eq!(grid.to_lines(), vec!["  ", " @"]);
    }

    #[test]
    fn oversized_leaf_is_clamped() {
        let tree = QuadNode::Leaf("#".into());
        let grid = decode_tree(&tree, &Metadata::new(3, 2)).unwrap();
        assert_eq!(grid.to_lines(), vec!["###", "###"]);
    }

    #[test]
    fn uniform_ink_collapses_to_leaf() {
        let grid = Grid::from_rows(&["@@@", "@@@", "@@@"]).unwrap();
        assert_eq!(encode_tree(&grid), QuadNode::Leaf("@".into()));
    }
}
