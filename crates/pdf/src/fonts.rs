//! The standard Type1 fonts used for rendering translated text.
//!
//! Translated text is always drawn with one of four base fonts that every PDF
//! viewer ships, so nothing needs to be embedded. Widths come from the Adobe
//! font metrics, in 1/1000 em.

use std::collections::HashMap;

use encoding_rs::WINDOWS_1252;
use unicode_normalization::UnicodeNormalization;

use crate::PdfError;

/// Base fonts available on destination pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    Courier,
}

impl StandardFont {
    pub const ALL: [StandardFont; 4] = [
        StandardFont::Helvetica,
        StandardFont::HelveticaBold,
        StandardFont::TimesRoman,
        StandardFont::Courier,
    ];

    /// PostScript name written to the font dictionary's `BaseFont`.
    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::Courier => "Courier",
        }
    }

    /// Key under which the font is registered in a page's `/Font` resources.
    pub fn resource_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
            StandardFont::TimesRoman => "F3",
            StandardFont::Courier => "F4",
        }
    }

    /// Look up a font by its exact PostScript name.
    pub fn from_base_font(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.base_font() == name)
    }

    /// Advance width of a single character in 1/1000 em.
    pub fn char_width(self, ch: char) -> f32 {
        if self == StandardFont::Courier {
            return 600.0;
        }

        let ch = match ch {
            '\u{00A0}' => ' ',
            c if c.is_ascii() => c,
            // Accented Latin letters share their base letter's advance.
            c => c.nfd().next().unwrap_or(c),
        };

        if (' '..='~').contains(&ch) {
            let table = match self {
                StandardFont::Helvetica => &HELVETICA_WIDTHS,
                StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
                StandardFont::TimesRoman => &TIMES_ROMAN_WIDTHS,
                StandardFont::Courier => return 600.0,
            };
            return f32::from(table[ch as usize - 0x20]);
        }

        self.punctuation_width(ch).unwrap_or_else(|| self.default_width())
    }

    /// Width of `text` in 1/1000 em (the font's glyph space).
    pub fn string_width(self, text: &str) -> f32 {
        text.chars().map(|c| self.char_width(c)).sum()
    }

    /// Width of `text` in page units when set at `font_size`.
    pub fn text_width(self, text: &str, font_size: f32) -> f32 {
        self.string_width(text) * font_size / 1000.0
    }

    /// Encode `text` for a `Tj` operand using WinAnsiEncoding.
    ///
    /// Fails with [`PdfError::UnmappableGlyph`] on the first character the
    /// encoding cannot represent.
    pub fn encode(self, text: &str) -> Result<Vec<u8>, PdfError> {
        let (bytes, _, had_errors) = WINDOWS_1252.encode(text);
        if !had_errors {
            return Ok(bytes.into_owned());
        }

        let mut buf = [0u8; 4];
        let ch = text
            .chars()
            .find(|c| WINDOWS_1252.encode(c.encode_utf8(&mut buf)).2)
            .unwrap_or(char::REPLACEMENT_CHARACTER);

        Err(PdfError::UnmappableGlyph {
            ch,
            font: self.base_font(),
        })
    }

    fn default_width(self) -> f32 {
        match self {
            StandardFont::Helvetica | StandardFont::HelveticaBold => 556.0,
            StandardFont::TimesRoman => 500.0,
            StandardFont::Courier => 600.0,
        }
    }

    /// Typographic punctuation outside ASCII that WinAnsi can encode.
    fn punctuation_width(self, ch: char) -> Option<f32> {
        let (single_quote, double_quote) = match self {
            StandardFont::Helvetica => (222.0, 333.0),
            StandardFont::HelveticaBold => (278.0, 500.0),
            StandardFont::TimesRoman => (333.0, 444.0),
            StandardFont::Courier => (600.0, 600.0),
        };

        let width = match ch {
            '\u{2018}' | '\u{2019}' | '\u{201A}' => single_quote,
            '\u{201C}' | '\u{201D}' | '\u{201E}' => double_quote,
            '\u{2013}' => self.default_width(),
            '\u{2014}' | '\u{2026}' | '\u{2030}' => 1000.0,
            '\u{2022}' => 350.0,
            '\u{20AC}' => self.default_width(),
            _ => return None,
        };
        Some(width)
    }
}

/// Font-name lookup with a Helvetica fallback.
///
/// Built once per translation request and only read afterwards.
#[derive(Debug, Clone)]
pub struct FontMapping {
    fonts: HashMap<String, StandardFont>,
}

impl Default for FontMapping {
    fn default() -> Self {
        let fonts = StandardFont::ALL
            .into_iter()
            .map(|f| (f.base_font().to_string(), f))
            .collect();
        Self { fonts }
    }
}

impl FontMapping {
    /// Resolve an extracted font name. Unknown or absent names map to
    /// Helvetica.
    pub fn resolve(&self, font_name: Option<&str>) -> StandardFont {
        font_name
            .and_then(|name| self.fonts.get(name))
            .copied()
            .unwrap_or(StandardFont::Helvetica)
    }
}

// Advance widths for U+0020..=U+007E.

const HELVETICA_WIDTHS: [u16; 95] = [
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

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];
