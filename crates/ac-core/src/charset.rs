use unicode_segmentation::UnicodeSegmentation;

/// Symbole blanc canonique. Jamais stocké par les codecs creux.
pub const BLANK: &str = " ";

/// Espace pleine largeur (U+3000), traité comme blanc.
pub const FULLWIDTH_BLANK: &str = "\u{3000}";

/// 10 caractères — compact, bon contraste.
pub const PALETTE_COMPACT: &str = " .:-=+*#%@";

/// 70 caractères — Paul Bourke extended.
pub const PALETTE_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Blocs Unicode — pseudo-pixels.
pub const PALETTE_BLOCKS: &str = " ░▒▓█";

/// Minimal — haut contraste.
pub const PALETTE_MINIMAL: &str = " .:░▒▓█";

/// Nom de palette : blanc puis chaque glyphe de la grille encodée.
pub const PALETTE_AUTO: &str = "auto";

/// True for both blank symbols.
///
/// # Example
/// ```
/// use ac_core::charset::is_blank;
/// assert!(is_blank(" "));
/// assert!(is_blank("\u{3000}"));
/// assert!(!is_blank("#"));
/// ```
#[inline]
#[must_use]
pub fn is_blank(glyph: &str) -> bool {
    glyph == BLANK || glyph == FULLWIDTH_BLANK
}

/// Map either blank symbol to [`BLANK`], leave anything else untouched.
#[inline]
#[must_use]
pub fn canonical(glyph: &str) -> &str {
    if is_blank(glyph) { BLANK } else { glyph }
}

/// Split text into display cells (extended grapheme clusters).
///
/// # Example
/// ```
/// use ac_core::charset::split_glyphs;
/// assert_eq!(split_glyphs("aé愛"), vec!["a", "é", "愛"]);
/// ```
#[must_use]
pub fn split_glyphs(text: &str) -> Vec<&str> {
    text.graphemes(true).collect()
}

/// Resolve a palette preset name, or treat the value as a literal palette.
///
/// # Example
/// ```
/// use ac_core::charset::{resolve_palette, PALETTE_BLOCKS};
/// assert_eq!(resolve_palette("blocks").concat(), PALETTE_BLOCKS);
/// assert_eq!(resolve_palette(" #"), vec![" ", "#"]);
/// ```
#[must_use]
pub fn resolve_palette(name_or_glyphs: &str) -> Vec<String> {
    let glyphs = match name_or_glyphs {
        "compact" => PALETTE_COMPACT,
        "standard" => PALETTE_STANDARD,
        "blocks" => PALETTE_BLOCKS,
        "minimal" => PALETTE_MINIMAL,
        other => other,
    };
    glyphs.graphemes(true).map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_have_expected_sizes() {
        assert_eq!(resolve_palette("compact").len(), 10);
        assert_eq!(resolve_palette("standard").len(), 70);
        assert_eq!(resolve_palette("minimal").len(), 7);
    }

    #[test]
    fn combining_marks_stay_in_one_cell() {
        let glyphs = split_glyphs("e\u{301}x");
        assert_eq!(glyphs, vec!["e\u{301}", "x"]);
    }

    #[test]
    fn canonical_folds_fullwidth_blank() {
        assert_eq!(canonical(FULLWIDTH_BLANK), BLANK);
        assert_eq!(canonical("つ"), "つ");
    }
}
