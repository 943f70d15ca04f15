//! WinAnsi text encoding for the standard Type1 fonts

/// Code points of the Windows-1252 block 0x80..=0x9F that have a glyph
const CP1252_HIGH: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

const REPLACEMENT: u8 = b'?';

fn encode_char(ch: char) -> u8 {
    match ch {
        ' '..='~' => ch as u8,
        '\u{00A0}'..='\u{00FF}' => ch as u32 as u8,
        _ => CP1252_HIGH
            .iter()
            .find(|(candidate, _)| *candidate == ch)
            .map(|(_, code)| *code)
            .unwrap_or(REPLACEMENT),
    }
}

/// Encode `text` for a font using `/WinAnsiEncoding`
///
/// Characters without a WinAnsi code, including control characters, become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

/// True if every character of `text` survives [`encode_win_ansi`]
pub fn is_win_ansi(text: &str) -> bool {
    text.chars().all(|ch| ch == '?' || encode_char(ch) != REPLACEMENT)
}
