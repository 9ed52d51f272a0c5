use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

use crate::charset::{BLANK, canonical, split_glyphs};
use crate::error::CoreError;
use crate::position::PositionIndex;

/// Grille de caractères `height × width`, row-major.
///
/// Chaque cellule est un glyphe (un grapheme). Les deux symboles blancs sont
/// ramenés à [`BLANK`] à la construction, donc deux grilles égales à l'écran
/// sont égales en mémoire.
///
/// # Example
/// ```
/// use ac_core::grid::Grid;
/// let grid = Grid::from_rows(&["#  ", " # ", "  #"]).unwrap();
/// assert_eq!(grid.width(), 3);
/// assert_eq!(grid.get(1, 1), Some("#"));
/// assert_eq!(grid.to_lines(), vec!["#  ", " # ", "  #"]);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<String>,
    index: PositionIndex,
}

impl Grid {
    /// Crée une grille remplie de blancs.
    ///
    /// # Errors
    /// Returns [`CoreError::MalformedMetadata`] if a dimension is zero.
    ///
    /// # Example
    /// ```
    /// use ac_core::grid::Grid;
    /// let grid = Grid::blank(4, 3).unwrap();
    /// assert!(grid.is_all_blank());
    /// assert!(Grid::blank(0, 3).is_err());
    /// ```
    pub fn blank(width: usize, height: usize) -> Result<Self, CoreError> {
        let index = PositionIndex::new(width, height)?;
        Ok(Self {
            cells: vec![BLANK.to_string(); index.len()],
            index,
        })
    }

    /// Build a grid from text rows.
    ///
    /// Width is the widest row in graphemes; shorter rows are padded with
    /// blank.
    ///
    /// # Errors
    /// Returns [`CoreError::MalformedMetadata`] if there are no rows or every
    /// row is empty.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, CoreError> {
        let split: Vec<Vec<&str>> = rows.iter().map(|r| split_glyphs(r.as_ref())).collect();
        let width = split.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Self::blank(width, split.len())?;
        for (row, glyphs) in split.iter().enumerate() {
            for (col, glyph) in glyphs.iter().enumerate() {
                let pos = grid.index.position_of(row, col);
                grid.cells[pos] = canonical(glyph).to_string();
            }
        }
        Ok(grid)
    }

    /// Split `text` on line breaks and build a grid from the lines.
    ///
    /// # Errors
    /// Same as [`Grid::from_rows`].
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let lines: Vec<&str> = text.lines().collect();
        Self::from_rows(&lines)
    }

    /// Width in cells.
    #[must_use]
    pub fn width(&self) -> usize {
        self.index.width()
    }

    /// Height in cells.
    #[must_use]
    pub fn height(&self) -> usize {
        self.index.height()
    }

    /// Position index matching this grid's shape.
    #[must_use]
    pub fn index(&self) -> PositionIndex {
        self.index
    }

    /// Glyph at `(row, col)`, `None` outside the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        if row >= self.height() || col >= self.width() {
            return None;
        }
        self.cell(self.index.position_of(row, col))
    }

    /// Glyph at linear position `pos`.
    #[inline]
    #[must_use]
    pub fn cell(&self, pos: usize) -> Option<&str> {
        self.cells.get(pos).map(String::as_str)
    }

    /// Écrit `glyph` à la position linéaire `pos`.
    ///
    /// Only the first grapheme of `glyph` is kept. Returns false (and writes
    /// nothing) when `pos` is outside the grid or `glyph` is empty, so
    /// decoders can count dropped entries instead of failing.
    #[inline]
    pub fn set(&mut self, pos: usize, glyph: &str) -> bool {
        let Some(first) = glyph.graphemes(true).next() else {
            return false;
        };
        match self.cells.get_mut(pos) {
            Some(cell) => {
                canonical(first).clone_into(cell);
                true
            }
            None => false,
        }
    }

    /// Same as [`Grid::set`], addressed by `(row, col)`.
    #[inline]
    pub fn set_at(&mut self, row: usize, col: usize, glyph: &str) -> bool {
        if row >= self.height() || col >= self.width() {
            return false;
        }
        self.set(self.index.position_of(row, col), glyph)
    }

    /// Cells in scan order with their linear position.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.cells.iter().map(String::as_str).enumerate()
    }

    /// Rows as slices of glyphs.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.cells.chunks(self.width())
    }

    /// Rows joined into fixed-width strings.
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        self.rows().map(|row| row.concat()).collect()
    }

    /// True if every cell is blank.
    #[must_use]
    pub fn is_all_blank(&self) -> bool {
        self.cells.iter().all(|c| c == BLANK)
    }

    /// Nombre de cellules non blanches.
    #[must_use]
    pub fn ink_count(&self) -> usize {
        self.cells.iter().filter(|c| *c != BLANK).count()
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("lines", &self.to_lines())
            .finish()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.to_lines().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::FULLWIDTH_BLANK;

    #[test]
    fn ragged_rows_are_padded() {
        let grid = Grid::from_rows(&["ab", "c", ""]).unwrap();
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.to_lines(), vec!["ab", "c ", "  "]);
    }

    #[test]
    fn empty_input_is_rejected() {
        let rows: [&str; 0] = [];
        assert!(Grid::from_rows(&rows).is_err());
        assert!(Grid::from_rows(&["", ""]).is_err());
    }

    #[test]
    fn fullwidth_blank_is_canonicalised() {
        let row = format!("つ{FULLWIDTH_BLANK}の");
        let grid = Grid::from_rows(&[row]).unwrap();
        assert_eq!(grid.get(0, 1), Some(BLANK));
        assert_eq!(grid.ink_count(), 2);
    }

    #[test]
    fn set_out_of_bounds_is_refused() {
        let mut grid = Grid::blank(2, 2).unwrap();
        assert!(grid.set(3, "#"));
        assert!(!grid.set(4, "#"));
        assert!(!grid.set_at(0, 2, "#"));
        assert_eq!(grid.to_lines(), vec!["  ", " #"]);
    }

    #[test]
    fn set_keeps_first_grapheme_only() {
        let mut grid = Grid::blank(2, 1).unwrap();
        assert!(grid.set(0, "ab"));
        assert!(!grid.set(1, ""));
        assert_eq!(grid.to_lines(), vec!["a "]);
    }

    #[test]
    fn multibyte_glyphs_take_one_cell() {
        let grid = Grid::parse("愛の\nつ ").unwrap();
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.get(0, 0), Some("愛"));
        assert_eq!(grid.to_string(), "愛の\nつ ");
    }
}
