//! Standard PDF fonts used for captions, with the advance widths needed to
//! center a caption line without loading a font program.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Base-14 fonts that every PDF reader provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StandardFont {
    Helvetica,
    TimesRoman,
    Courier,
}

// Advance widths (1/1000 em) for WinAnsi codes 32..=126, from the Adobe AFM files.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];
const COURIER_WIDTH: u16 = 600;

impl StandardFont {
    /// Resolves a family name such as `"Helvetica"`, `"Times-Roman"` or `"TimesRoman"`.
    /// Unknown families fall back to Helvetica.
    pub fn from_family(family: &str) -> Self {
        let key: String = family
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "helvetica" | "arial" | "sansserif" => Self::Helvetica,
            "times" | "timesroman" | "timesnewroman" | "serif" => Self::TimesRoman,
            "courier" | "couriernew" | "monospace" => Self::Courier,
            _ => {
                warn!(family, "unknown caption font, using Helvetica");
                Self::Helvetica
            }
        }
    }

    /// PostScript name written to the font dictionary.
    pub fn base_font(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::TimesRoman => "Times-Roman",
            Self::Courier => "Courier",
        }
    }

    fn glyph_width(self, code: u8) -> u16 {
        let table = match self {
            Self::Helvetica => &HELVETICA,
            Self::TimesRoman => &TIMES_ROMAN,
            Self::Courier => return COURIER_WIDTH,
        };
        match code {
            32..=126 => table[(code - 32) as usize],
            // outside the table: average lowercase width
            _ => table[(b'n' - 32) as usize],
        }
    }

    /// Width of `text` set at `size` points, measured on its WinAnsi encoding.
    pub fn text_width(self, text: &str, size: f64) -> f64 {
        let units: u32 = encode_win_ansi(text)
            .into_iter()
            .map(|c| self.glyph_width(c) as u32)
            .sum();
        units as f64 * size / 1000.0
    }
}

/// Single-byte encoding for a base-14 font: Latin-1 code points map to
/// themselves, anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(c as u32).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_names_resolve() {
        assert_eq!(StandardFont::from_family("Helvetica"), StandardFont::Helvetica);
        assert_eq!(StandardFont::from_family("Times-Roman"), StandardFont::TimesRoman);
        assert_eq!(StandardFont::from_family("TimesRoman"), StandardFont::TimesRoman);
        assert_eq!(StandardFont::from_family("courier"), StandardFont::Courier);
        assert_eq!(StandardFont::from_family("NotoSansJP"), StandardFont::Helvetica);
    }

    #[test]
    fn widths_follow_metrics() {
        // H=722 e=556 l=222 l=222 o=556
        let w = StandardFont::Helvetica.text_width("Hello", 10.0);
        assert!((w - 22.78).abs() < 1e-9);
        assert_eq!(StandardFont::Courier.text_width("abc", 10.0), 18.0);
        assert_eq!(StandardFont::TimesRoman.text_width("", 12.0), 0.0);
    }

    #[test]
    fn non_latin_text_is_replaced() {
        assert_eq!(encode_win_ansi("a\u{e9}\u{3042}"), vec![b'a', 0xe9, b'?']);
    }
}
