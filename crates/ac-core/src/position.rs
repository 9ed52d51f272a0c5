use crate::error::CoreError;

/// Plafond par défaut du nombre de cellules d'une grille décodée (4096×4096).
pub const DEFAULT_MAX_CELLS: usize = 4096 * 4096;

/// Conversion entre `(row, col)` et position linéaire row-major.
///
/// Every codec that stores linear positions goes through this type so the
/// same `(row, col)` pair is rebuilt on decode.
///
/// # Example
/// ```
/// use ac_core::position::PositionIndex;
/// let index = PositionIndex::new(3, 3).unwrap();
/// assert_eq!(index.position_of(1, 1), 4);
/// assert_eq!(index.row_col_of(8), (2, 2));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionIndex {
    width: usize,
    height: usize,
    cells: usize,
}

impl PositionIndex {
    /// Build an index for a `width × height` grid.
    ///
    /// # Errors
    /// Returns [`CoreError::MalformedMetadata`] if either dimension is zero
    /// or `width * height` overflows.
    pub fn new(width: usize, height: usize) -> Result<Self, CoreError> {
        match width.checked_mul(height) {
            Some(cells) if cells > 0 => Ok(Self {
                width,
                height,
                cells,
            }),
            _ => Err(CoreError::MalformedMetadata { width, height }),
        }
    }

    /// Width in cells.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Nombre total de cellules (`width * height`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells
    }

    /// Always false: a valid index has at least one cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `row * width + col`.
    #[inline]
    #[must_use]
    pub fn position_of(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// `(pos / width, pos % width)`.
    #[inline]
    #[must_use]
    pub fn row_col_of(&self, pos: usize) -> (usize, usize) {
        (pos / self.width, pos % self.width)
    }

    /// True if `pos` addresses a cell of the grid.
    ///
    /// # Example
    /// ```
    /// use ac_core::position::PositionIndex;
    /// let index = PositionIndex::new(4, 3).unwrap();
    /// assert!(index.contains(11));
    /// assert!(!index.contains(12));
    /// ```
    #[inline]
    #[must_use]
    pub fn contains(&self, pos: usize) -> bool {
        pos < self.len()
    }
}
