//! Metrics and encoding for the two standard Type1 faces used on receipts.
//!
//! Standard 14 fonts are not embedded, so the widths below come from the
//! Adobe AFM files and text is written in WinAnsiEncoding.

/// Advance widths (1/1000 em) for Helvetica, characters 0x20..=0x7E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Advance widths (1/1000 em) for Helvetica-Bold, characters 0x20..=0x7E.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a..m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n..z
    389, 280, 389, 584, // {..~
];

const ASCENDER: f32 = 0.718;
const LINE_GAP_FACTOR: f32 = 1.156;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    /// Resource name the page content refers to.
    pub const fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    pub const fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }

    /// Distance between consecutive baselines at `size`.
    pub fn line_height(self, size: f32) -> f32 {
        size * LINE_GAP_FACTOR
    }

    /// Distance from the top of a line box to its baseline.
    pub fn ascent(self, size: f32) -> f32 {
        size * ASCENDER
    }

    /// Rendered width of `text` in points.
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|ch| u32::from(self.glyph_width(ch))).sum();
        units as f32 * size / 1000.0
    }

    fn glyph_width(self, ch: char) -> u16 {
        let table = match self {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        match fold_accent(ch) {
            c @ ' '..='~' => table[c as usize - 0x20],
            '\u{FE0F}' => 0,
            '°' => 400,
            '©' | '®' => 737,
            '•' => 350,
            '…' => 1000,
            '–' => 556,
            '—' => 1000,
            '¡' => 333,
            '¿' => 611,
            '‘' | '’' => 222,
            '“' | '”' => 333,
            _ => 556,
        }
    }
}

/// Maps accented Latin letters onto the base glyph sharing their width.
fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}

/// Encodes text for a WinAnsiEncoding font. Characters outside the code page
/// become `?`; emoji presentation selectors are dropped.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|&ch| ch != '\u{FE0F}')
        .map(|ch| match ch {
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '\t' => b' ',
            c if (' '..='~').contains(&c) => c as u8,
            c if ('\u{A0}'..='\u{FF}').contains(&c) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Breaks `text` into lines no wider than `max_width`, honoring explicit
/// newlines. Words wider than a line are split between characters.
pub fn wrap_text(font: Font, size: f32, text: &str, max_width: f32) -> Vec<String> {
    let limit = (max_width * 1000.0 / size).max(0.0);
    let space = f32::from(font.glyph_width(' '));
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut width = 0.0_f32;
        for word in paragraph.split_whitespace() {
            let word_width: f32 = word.chars().map(|ch| f32::from(font.glyph_width(ch))).sum();
            if !current.is_empty() && width + space + word_width <= limit {
                current.push(' ');
                current.push_str(word);
                width += space + word_width;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                width = 0.0;
            }
            if word_width <= limit {
                current.push_str(word);
                width = word_width;
                continue;
            }
            for ch in word.chars() {
                let glyph = f32::from(font.glyph_width(ch));
                if !current.is_empty() && width + glyph > limit {
                    lines.push(std::mem::take(&mut current));
                    width = 0.0;
                }
                current.push(ch);
                width += glyph;
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_known_strings() {
        // "Hello" = 722 + 556 + 222 + 222 + 556 in Helvetica.
        assert!((Font::Regular.text_width("Hello", 10.0) - 22.78).abs() < 0.01);
        assert!(Font::Bold.text_width("Hello", 10.0) > Font::Regular.text_width("Hello", 10.0));
    }

    #[test]
    fn accented_letters_share_base_width() {
        assert_eq!(
            Font::Regular.text_width("Categoría", 12.0),
            Font::Regular.text_width("Categoria", 12.0)
        );
    }

    #[test]
    fn encodes_spanish_text_in_win_ansi() {
        assert_eq!(encode_win_ansi("N° 1"), vec![b'N', 0xB0, b' ', b'1']);
        assert_eq!(encode_win_ansi("ítem"), vec![0xED, b't', b'e', b'm']);
        assert_eq!(encode_win_ansi("• ok"), vec![0x95, b' ', b'o', b'k']);
        assert_eq!(encode_win_ansi("©\u{FE0F} x"), vec![0xA9, b' ', b'x']);
        assert_eq!(encode_win_ansi("ok 😀"), b"ok ?".to_vec());
    }

    #[test]
    fn wraps_long_paragraphs() {
        let text = "uno dos tres cuatro cinco seis siete ocho nueve diez";
        let lines = wrap_text(Font::Regular, 12.0, text, 100.0);

        assert!(lines.len() > 1);
        assert!(
            lines
                .iter()
                .all(|l| Font::Regular.text_width(l, 12.0) <= 100.0)
        );
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn keeps_explicit_line_breaks() {
        let lines = wrap_text(Font::Regular, 12.0, "a\nb", 500.0);
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn splits_words_wider_than_a_line() {
        let word = "A".repeat(100);
        let lines = wrap_text(Font::Regular, 12.0, &format!("x {word} y"), 100.0);

        assert!(lines.len() > 3);
        assert!(
            lines
                .iter()
                .all(|l| Font::Regular.text_width(l, 12.0) <= 100.0 + 1e-3)
        );
        assert_eq!(lines.concat().replace(' ', ""), format!("x{word}y"));
    }

    #[test]
    fn wraps_very_long_input_quickly() {
        let text = "B".repeat(200_000);
        let started = std::time::Instant::now();

        let lines = wrap_text(Font::Bold, 12.0, &text, 492.0);

        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        assert_eq!(lines.iter().map(|l| l.len()).sum::<usize>(), 200_000);
    }
}
