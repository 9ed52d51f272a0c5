//! `bitmap` : index de palette par cellule, empaquetés en chaîne.
//!
//! La base dépend de la taille de palette : hexadécimal jusqu'à 16 entrées,
//! alphabet de 64 symboles jusqu'à 64, octets bruts (base64) au-delà.
//!
//! Glyphs missing from the palette are lossy: with
//! [`UnknownGlyph::FirstEntry`] they become palette index 0, with
//! [`UnknownGlyph::Reject`] the encode fails.

use std::collections::HashMap;

use ac_core::charset::{BLANK, canonical};
use ac_core::config::UnknownGlyph;
use ac_core::{ColorLayer, Grid};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::CodecError;
use crate::payload::{CodecTag, Decoded, Metadata};
use crate::traits::{GridDecoder, GridEncoder};

/// Alphabet des palettes de 17 à 64 entrées.
pub const RADIX64_ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz+/";

/// Plus grande palette indexable sur un octet.
pub const MAX_PALETTE: usize = 256;

/// Packing base chosen from the palette length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Packing {
    /// One hex digit per cell.
    Hex,
    /// One [`RADIX64_ALPHABET`] symbol per cell.
    Radix64,
    /// One byte per cell, the byte string base64-encoded.
    Bytes,
}

impl Packing {
    /// Base for a palette of `len` entries.
    ///
    /// # Errors
    /// Returns [`CodecError::IncompletePalette`] for an empty palette.
    ///
    /// # Example
    /// ```
    /// use ac_codec::bitmap::Packing;
    /// assert_eq!(Packing::for_palette(16).unwrap(), Packing::Hex);
    /// assert_eq!(Packing::for_palette(17).unwrap(), Packing::Radix64);
    /// assert_eq!(Packing::for_palette(65).unwrap(), Packing::Bytes);
    /// assert!(Packing::for_palette(0).is_err());
    /// ```
    pub fn for_palette(len: usize) -> Result<Self, CodecError> {
        match len {
            0 => Err(CodecError::IncompletePalette("palette vide".into())),
            1..=16 => Ok(Self::Hex),
            17..=64 => Ok(Self::Radix64),
            _ => Ok(Self::Bytes),
        }
    }
}

/// Pack indices. Each index must be below the palette length.
#[must_use]
pub fn pack(indices: &[u8], packing: Packing) -> String {
    match packing {
        Packing::Hex => indices
            .iter()
            .filter_map(|&i| char::from_digit(u32::from(i), 16))
            .collect(),
        Packing::Radix64 => indices
            .iter()
            .map(|&i| char::from(RADIX64_ALPHABET[usize::from(i) & 63]))
            .collect(),
        Packing::Bytes => STANDARD.encode(indices),
    }
}

/// Unpack a string; unreadable symbols become `None`.
///
/// # Errors
/// Returns [`CodecError::MalformedPayload`] if a byte-packed stream is not
/// valid base64.
///
/// # Example
/// ```
/// use ac_codec::bitmap::{unpack, Packing};
/// assert_eq!(unpack("0aF?", Packing::Hex).unwrap(), vec![Some(0), Some(10), Some(15), None]);
/// ```
pub fn unpack(packed: &str, packing: Packing) -> Result<Vec<Option<u8>>, CodecError> {
    Ok(match packing {
        Packing::Hex => packed
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect(),
        Packing::Radix64 => packed
            .bytes()
            .map(|b| RADIX64_ALPHABET.iter().position(|&a| a == b).map(|i| i as u8))
            .collect(),
        Packing::Bytes => STANDARD
            .decode(packed.trim())
            .map_err(|e| CodecError::MalformedPayload(format!("bitmap base64 : {e}")))?
            .into_iter()
            .map(Some)
            .collect(),
    })
}

fn de_palette<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PaletteRepr {
        List(Vec<String>),
        Text(String),
    }
    Ok(match PaletteRepr::deserialize(deserializer)? {
        PaletteRepr::List(list) => list,
        PaletteRepr::Text(text) => text.graphemes(true).map(String::from).collect(),
    })
}

/// Données `bitmap` : `{c: palette, b: indices empaquetés}`.
///
/// The long names `charset` / `bitmap` are accepted on input, and the
/// palette may be a list or a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitmapData {
    /// Palette, one glyph per entry.
    #[serde(alias = "charset", deserialize_with = "de_palette")]
    pub c: Vec<String>,
    /// Packed indices, row-major.
    #[serde(alias = "bitmap")]
    pub b: String,
}

/// Codec `bitmap`.
#[derive(Clone, Debug)]
pub struct BitmapCodec {
    /// Caller-supplied palette.
    pub palette: Vec<String>,
    /// Policy for glyphs missing from the palette.
    pub unknown: UnknownGlyph,
}

impl BitmapCodec {
    /// Codec with the default (lossy, logged) policy.
    #[must_use]
    pub fn new(palette: Vec<String>) -> Self {
        Self {
            palette,
            unknown: UnknownGlyph::FirstEntry,
        }
    }

    /// Codec whose palette is blank followed by every glyph of `grid`, in
    /// order of first appearance. Always lossless for that grid.
    ///
    /// # Example
    /// ```
    /// use ac_codec::bitmap::BitmapCodec;
    /// use ac_core::Grid;
    /// let grid = Grid::from_rows(&["ab", "ba"]).unwrap();
    /// assert_eq!(BitmapCodec::covering(&grid).palette, vec![" ", "a", "b"]);
    /// ```
    #[must_use]
    pub fn covering(grid: &Grid) -> Self {
        let mut palette = vec![BLANK.to_string()];
        for (_, glyph) in grid.iter() {
            if !palette.iter().any(|p| p == glyph) {
                palette.push(glyph.to_string());
            }
        }
        Self::new(palette)
    }
}

impl GridEncoder for BitmapCodec {
    const TAG: CodecTag = CodecTag::Bitmap;
    type Data = BitmapData;

    fn encode(&self, grid: &Grid, _colors: Option<&ColorLayer>) -> Result<BitmapData, CodecError> {
        if self.palette.len() > MAX_PALETTE {
            return Err(CodecError::PaletteTooLarge {
                len: self.palette.len(),
            });
        }
        let packing = Packing::for_palette(self.palette.len())?;

        let mut lookup: HashMap<&str, u8> = HashMap::with_capacity(self.palette.len());
        for (i, glyph) in self.palette.iter().enumerate() {
            lookup.entry(canonical(glyph)).or_insert(i as u8);
        }

        let mut missing = 0usize;
        let mut indices = Vec::with_capacity(grid.width() * grid.height());
        for (_, glyph) in grid.iter() {
            if let Some(&i) = lookup.get(glyph) {
                indices.push(i);
                continue;
            }
            match self.unknown {
                UnknownGlyph::Reject => {
                    return Err(CodecError::IncompletePalette(format!(
                        "glyphe {glyph:?} absent de la palette"
                    )));
                }
                UnknownGlyph::FirstEntry => {
                    missing += 1;
                    indices.push(0);
                }
            }
        }
        if missing > 0 {
            log::warn!(
                "Bitmap : {missing} cellule(s) hors palette remplacée(s) par {:?}",
                self.palette[0]
            );
        }

        Ok(BitmapData {
            c: self.palette.clone(),
            b: pack(&indices, packing),
        })
    }
}

/// Décodeur `bitmap` (la palette voyage avec les données).
#[derive(Clone, Copy, Debug, Default)]
pub struct BitmapDecoder;

impl GridDecoder for BitmapDecoder {
    type Data = BitmapData;

    fn decode(&self, data: &BitmapData, meta: &Metadata) -> Result<Decoded, CodecError> {
        let packing = Packing::for_palette(data.c.len())?;
        let indices = unpack(&data.b, packing)?;
        let mut grid = meta.blank_grid()?;

        let mut unreadable = 0usize;
        let mut overflow = 0usize;
        for (pos, index) in indices.into_iter().enumerate() {
            match index.and_then(|i| data.c.get(usize::from(i))) {
                Some(glyph) if !glyph.is_empty() => {
                    if !grid.set(pos, glyph) {
                        overflow += 1;
                    }
                }
                _ => unreadable += 1,
            }
        }
        if unreadable > 0 {
            log::warn!("Bitmap : {unreadable} index illisible(s) ou hors palette, laissé(s) blancs");
        }
        if overflow > 0 {
            log::warn!("Bitmap : {overflow} index au-delà de la grille ignoré(s)");
        }
        Ok(Decoded::plain(grid))
    }
}
