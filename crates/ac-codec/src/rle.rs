//! `rle` : paires `[glyphe, longueur]`.
//!
//! Wire glyphs:
//! - `"_"` is a run of blanks;
//! - `"__"` is a run of literal underscores;
//! - `"\n"` ends a row (row-delimited variant only);
//! - anything else is literal.
//!
//! The decoder accepts both variants: a marker right after an automatic wrap
//! at `width` is absorbed, so row-delimited and continuous streams decode to
//! the same grid.

use ac_core::charset::BLANK;
use ac_core::config::RleMode;
use ac_core::{ColorLayer, Grid};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::CodecError;
use crate::payload::{CodecTag, Decoded, Metadata};
use crate::traits::{GridDecoder, GridEncoder};

/// Échappement d'une suite de blancs.
pub const BLANK_ESCAPE: &str = "_";
/// Underscore littéral.
pub const LITERAL_ESCAPE: &str = "__";
/// Marqueur de fin de ligne.
pub const LINE_BREAK: &str = "\n";

/// One `[glyph, count]` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run(pub String, pub usize);

fn wire_glyph(glyph: &str) -> &str {
    match glyph {
        BLANK => BLANK_ESCAPE,
        BLANK_ESCAPE => LITERAL_ESCAPE,
        other => other,
    }
}

/// Accumulate runs over a cell iterator.
fn push_runs<'a>(runs: &mut Vec<Run>, cells: impl Iterator<Item = &'a String>) {
    let mut current: Option<(&str, usize)> = None;
    for cell in cells {
        if let Some((glyph, count)) = current.as_mut() {
            if *glyph == cell.as_str() {
                *count += 1;
                continue;
            }
        }
        if let Some((glyph, count)) = current.take() {
            runs.push(Run(wire_glyph(glyph).to_string(), count));
        }
        current = Some((cell.as_str(), 1));
    }
    if let Some((glyph, count)) = current {
        runs.push(Run(wire_glyph(glyph).to_string(), count));
    }
}

/// Encode `grid` in the given variant.
///
/// # Example
/// ```
/// use ac_codec::rle::{encode_runs, Run};
/// use ac_core::config::RleMode;
/// use ac_core::Grid;
/// let grid = Grid::from_rows(&["##", "  "]).unwrap();
/// assert_eq!(
///     encode_runs(&grid, RleMode::Continuous),
///     vec![Run("#".into(), 2), Run("_".into(), 2)]
/// );
/// ```
#[must_use]
pub fn encode_runs(grid: &Grid, mode: RleMode) -> Vec<Run> {
    let mut runs = Vec::new();
    match mode {
        RleMode::Continuous => push_runs(&mut runs, grid.rows().flatten()),
        RleMode::RowDelimited => {
            for (i, row) in grid.rows().enumerate() {
                if i > 0 {
                    runs.push(Run(LINE_BREAK.to_string(), 1));
                }
                push_runs(&mut runs, row.iter());
            }
        }
    }
    runs
}

/// Curseur d'écriture qui replie à `width`.
struct Cursor<'g> {
    grid: &'g mut Grid,
    row: usize,
    col: usize,
    just_wrapped: bool,
    overflow: usize,
}

impl Cursor<'_> {
    fn put(&mut self, glyph: &str) {
        if self.row >= self.grid.height() {
            self.overflow = self.overflow.saturating_add(1);
            return;
        }
        self.grid.set_at(self.row, self.col, glyph);
        self.col += 1;
        self.just_wrapped = false;
        if self.col == self.grid.width() {
            self.col = 0;
            self.row += 1;
            self.just_wrapped = true;
        }
    }

    fn repeat(&mut self, glyphs: &[&str], count: usize) {
        for done in 0..count {
            if self.row >= self.grid.height() {
                let dropped = (count - done).saturating_mul(glyphs.len());
                self.overflow = self.overflow.saturating_add(dropped);
                return;
            }
            glyphs.iter().for_each(|g| self.put(g));
        }
    }

    fn line_break(&mut self) {
        if self.just_wrapped {
            self.just_wrapped = false;
            return;
        }
        self.row += 1;
        self.col = 0;
    }
}

/// Decode runs of either variant into a fresh grid.
///
/// # Errors
/// Returns [`CodecError::MalformedMetadata`] if `meta` has a zero dimension.
pub fn decode_runs(runs: &[Run], meta: &Metadata) -> Result<Grid, CodecError> {
    let mut grid = meta.blank_grid()?;
    let mut cursor = Cursor {
        grid: &mut grid,
        row: 0,
        col: 0,
        just_wrapped: false,
        overflow: 0,
    };

    for Run(glyph, count) in runs {
        match glyph.as_str() {
            LINE_BREAK => {
                let breaks = (*count).min(meta.height.saturating_add(1));
                (0..breaks).for_each(|_| cursor.line_break());
            }
            BLANK_ESCAPE => cursor.repeat(&[BLANK], *count),
            LITERAL_ESCAPE => cursor.repeat(&[BLANK_ESCAPE], *count),
            "" => log::warn!("Run vide ignoré"),
            other => {
                let glyphs: Vec<&str> = other.graphemes(true).collect();
                cursor.repeat(&glyphs, *count);
            }
        }
    }

    if cursor.overflow > 0 {
        log::warn!("RLE : {} cellule(s) au-delà de la grille ignorée(s)", cursor.overflow);
    }
    Ok(grid)
}

/// Codec `rle`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RleCodec {
    /// Variante produite à l'encodage.
    pub mode: RleMode,
}

impl GridEncoder for RleCodec {
    const TAG: CodecTag = CodecTag::Rle;
    type Data = Vec<Run>;

    fn encode(&self, grid: &Grid, _colors: Option<&ColorLayer>) -> Result<Vec<Run>, CodecError> {
        Ok(encode_runs(grid, self.mode))
    }
}

impl GridDecoder for RleCodec {
    type Data = Vec<Run>;

    fn decode(&self, data: &Vec<Run>, meta: &Metadata) -> Result<Decoded, CodecError> {
        decode_runs(data, meta).map(Decoded::plain)
    }
}
