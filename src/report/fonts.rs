//! Standard-14 Helvetica metrics and WinAnsi text encoding

use pdf_writer::Name;

/// The three Helvetica faces used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    pub const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Oblique];

    /// Resource name used inside page content streams
    pub fn resource(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"F1"),
            Font::Bold => Name(b"F2"),
            Font::Oblique => Name(b"F3"),
        }
    }

    pub fn base_font(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"Helvetica"),
            Font::Bold => Name(b"Helvetica-Bold"),
            Font::Oblique => Name(b"Helvetica-Oblique"),
        }
    }

    /// Advance width of encoded text in points
    pub fn text_width(self, encoded: &[u8], size: f32) -> f32 {
        // Bold glyphs run roughly 5% wider than the regular face
        let scale = match self {
            Font::Bold => 1.05,
            Font::Regular | Font::Oblique => 1.0,
        };
        let units: u32 = encoded.iter().map(|&b| glyph_width(b) as u32).sum();
        units as f32 * size * scale / 1000.0
    }
}

/// Helvetica AFM widths for 0x20..=0x7E
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

fn glyph_width(byte: u8) -> u16 {
    match byte {
        0x20..=0x7E => ASCII_WIDTHS[(byte - 0x20) as usize],
        _ => 556,
    }
}

/// Encode text for a standard font with `WinAnsiEncoding`
///
/// Latin-1 maps straight through, a handful of typographic characters map
/// to their cp1252 slots, control characters become spaces and anything
/// else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => ch as u8,
            '\u{0}'..='\u{1F}' | '\u{7F}' => b' ',
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding() {
        assert_eq!(encode_win_ansi("abc"), b"abc");
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("a\tb"), b"a b");
        assert_eq!(encode_win_ansi("’"), vec![0x92]);
        assert_eq!(encode_win_ansi("日本"), b"??");
    }

    #[test]
    fn test_widths() {
        assert_eq!(glyph_width(b' '), 278);
        assert_eq!(glyph_width(b'@'), 1015);
        assert_eq!(glyph_width(b'W'), 944);
        assert_eq!(glyph_width(b'~'), 584);
        let w = Font::Regular.text_width(b"ii", 10.0);
        assert!((w - 4.44).abs() < 1e-4);
        assert!(Font::Bold.text_width(b"Type", 10.0) > Font::Regular.text_width(b"Type", 10.0));
    }
}
