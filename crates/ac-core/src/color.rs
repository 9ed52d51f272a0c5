use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::grid::Grid;
use crate::position::PositionIndex;

/// Les 8 couleurs ANSI de base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NamedColor {
    /// Noir.
    Black,
    /// Rouge.
    Red,
    /// Vert.
    Green,
    /// Jaune.
    Yellow,
    /// Bleu.
    Blue,
    /// Magenta.
    Magenta,
    /// Cyan.
    Cyan,
    /// Blanc.
    White,
}

impl NamedColor {
    /// Lowercase wire name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::White => "white",
        }
    }
}

/// Couleur d'une cellule : nommée, index de palette 256, ou RGB.
///
/// Its wire key is `"red"`, `"196"` or `"255,0,0"`.
///
/// # Example
/// ```
/// use ac_core::color::{CellColor, NamedColor};
/// let c: CellColor = "12,200,7".parse().unwrap();
/// assert_eq!(c, CellColor::Rgb(12, 200, 7));
/// assert_eq!(c.key(), "12,200,7");
/// assert_eq!("cyan".parse::<CellColor>().unwrap(), CellColor::Named(NamedColor::Cyan));
/// assert_eq!("196".parse::<CellColor>().unwrap(), CellColor::Indexed(196));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellColor {
    /// Basic named color.
    Named(NamedColor),
    /// Palette index (ANSI 256).
    Indexed(u8),
    /// Truecolor.
    Rgb(u8, u8, u8),
}

impl CellColor {
    /// Wire key for position maps.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => f.write_str(n.name()),
            Self::Indexed(i) => write!(f, "{i}"),
            Self::Rgb(r, g, b) => write!(f, "{r},{g},{b}"),
        }
    }
}

impl FromStr for CellColor {
    type Err = CoreError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let key = key.trim();
        let bad = || CoreError::Config(format!("clé couleur invalide : {key:?}"));

        if key.contains(',') {
            let parts: Vec<&str> = key.split(',').map(str::trim).collect();
            if let [r, g, b] = parts.as_slice() {
                let r = r.parse().map_err(|_| bad())?;
                let g = g.parse().map_err(|_| bad())?;
                let b = b.parse().map_err(|_| bad())?;
                return Ok(Self::Rgb(r, g, b));
            }
            return Err(bad());
        }
        if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            return key.parse().map(Self::Indexed).map_err(|_| bad());
        }
        let named = match key.to_ascii_lowercase().as_str() {
            "black" => NamedColor::Black,
            "red" => NamedColor::Red,
            "green" => NamedColor::Green,
            "yellow" => NamedColor::Yellow,
            "blue" => NamedColor::Blue,
            "magenta" => NamedColor::Magenta,
            "cyan" => NamedColor::Cyan,
            "white" => NamedColor::White,
            _ => return Err(bad()),
        };
        Ok(Self::Named(named))
    }
}

/// Couche couleur parallèle à une [`Grid`]. `None` = couleur par défaut.
///
/// # Example
/// ```
/// use ac_core::color::{CellColor, ColorLayer};
/// let mut layer = ColorLayer::new(2, 2).unwrap();
/// layer.set(3, CellColor::Indexed(9));
/// assert_eq!(layer.get(1, 1), Some(CellColor::Indexed(9)));
/// assert_eq!(layer.get(0, 0), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorLayer {
    cells: Vec<Option<CellColor>>,
    index: PositionIndex,
}

impl ColorLayer {
    /// Couche vide (aucune couleur explicite).
    ///
    /// # Errors
    /// Returns [`CoreError::MalformedMetadata`] if a dimension is zero.
    pub fn new(width: usize, height: usize) -> Result<Self, CoreError> {
        let index = PositionIndex::new(width, height)?;
        Ok(Self {
            cells: vec![None; index.len()],
            index,
        })
    }

    /// Build a layer from rows of optional colors, padding short rows.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if the rows do not fit `grid`.
    pub fn from_rows(grid: &Grid, rows: &[Vec<Option<CellColor>>]) -> Result<Self, CoreError> {
        let mut layer = Self::new(grid.width(), grid.height())?;
        let too_wide = rows.iter().any(|r| r.len() > grid.width());
        if rows.len() > grid.height() || too_wide {
            return Err(CoreError::InvalidDimensions {
                expected_width: grid.width(),
                expected_height: grid.height(),
                width: rows.iter().map(Vec::len).max().unwrap_or(0),
                height: rows.len(),
            });
        }
        for (row, colors) in rows.iter().enumerate() {
            for (col, color) in colors.iter().enumerate() {
                layer.cells[layer.index.position_of(row, col)] = *color;
            }
        }
        Ok(layer)
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

    /// Color at `(row, col)`; `None` if unset or outside the layer.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<CellColor> {
        if row >= self.height() || col >= self.width() {
            return None;
        }
        self.cells[self.index.position_of(row, col)]
    }

    /// Set the color at linear position `pos`; false if out of bounds.
    pub fn set(&mut self, pos: usize, color: CellColor) -> bool {
        match self.cells.get_mut(pos) {
            Some(cell) => {
                *cell = Some(color);
                true
            }
            None => false,
        }
    }

    /// Colored cells in scan order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, CellColor)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(pos, c)| c.map(|c| (pos, c)))
    }

    /// Same-shaped color table, one row per grid row.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<Option<CellColor>>> {
        self.cells.chunks(self.width()).map(<[_]>::to_vec).collect()
    }

    /// Check this layer has the shape of `grid`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] on mismatch.
    pub fn check_shape(&self, grid: &Grid) -> Result<(), CoreError> {
        if self.width() == grid.width() && self.height() == grid.height() {
            return Ok(());
        }
        Err(CoreError::InvalidDimensions {
            expected_width: grid.width(),
            expected_height: grid.height(),
            width: self.width(),
            height: self.height(),
        })
    }
}
