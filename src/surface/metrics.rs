//! Standard-14 font metrics and single-byte text encoding.
//!
//! Both surfaces measure text with the same AFM advance widths, so a layout
//! recorded for a preview wraps exactly like the PDF that gets written.
//!
//! Text is split into runs per charset: WinAnsi for the Helvetica/Courier
//! faces, the `Symbol` font for Greek letters and math operators, and
//! `ZapfDingbats` for check marks and task-list boxes. Anything else becomes
//! `?`.

use super::{FontFamily, FontStyle};

/// Which built-in font a run of bytes must be shown with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    WinAnsi,
    Symbol,
    Dingbats,
}

/// A maximal run of bytes sharing one charset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub charset: Charset,
    pub bytes: Vec<u8>,
}

/// Encode `text` into charset runs. Control characters other than tab are
/// dropped; tab becomes a space.
pub fn encode_runs(text: &str) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for ch in text.chars() {
        let Some((charset, byte)) = encode_char(ch) else {
            continue;
        };
        match runs.last_mut() {
            Some(run) if run.charset == charset => run.bytes.push(byte),
            _ => runs.push(Run {
                charset,
                bytes: vec![byte],
            }),
        }
    }
    runs
}

fn encode_char(ch: char) -> Option<(Charset, u8)> {
    if ch == '\t' {
        return Some((Charset::WinAnsi, b' '));
    }
    if ch.is_control() {
        return None;
    }
    if (' '..='~').contains(&ch) || ('\u{A0}'..='\u{FF}').contains(&ch) {
        return Some((Charset::WinAnsi, ch as u32 as u8));
    }
    if let Some(b) = win_ansi_special(ch) {
        return Some((Charset::WinAnsi, b));
    }
    if let Some(b) = symbol_code(ch) {
        return Some((Charset::Symbol, b));
    }
    if let Some(b) = dingbat_code(ch) {
        return Some((Charset::Dingbats, b));
    }
    Some((Charset::WinAnsi, b'?'))
}

fn win_ansi_special(ch: char) -> Option<u8> {
    Some(match ch {
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        _ => return None,
    })
}

fn symbol_code(ch: char) -> Option<u8> {
    Some(match ch {
        'α' => b'a',
        'β' => b'b',
        'γ' => b'g',
        'δ' => b'd',
        'ε' => b'e',
        'ζ' => b'z',
        'η' => b'h',
        'θ' => b'q',
        'ι' => b'i',
        'κ' => b'k',
        'λ' => b'l',
        'μ' => b'm',
        'ν' => b'n',
        'ξ' => b'x',
        'π' => b'p',
        'ρ' => b'r',
        'σ' => b's',
        'τ' => b't',
        'υ' => b'u',
        'φ' => b'f',
        'χ' => b'c',
        'ψ' => b'y',
        'ω' => b'w',
        'Γ' => b'G',
        'Δ' => b'D',
        'Θ' => b'Q',
        'Λ' => b'L',
        'Ξ' => b'X',
        'Π' => b'P',
        'Σ' => b'S',
        'Φ' => b'F',
        'Ψ' => b'Y',
        'Ω' => b'W',
        '∀' => 0x22,
        '∃' => 0x24,
        '∼' => 0x7E,
        '≤' => 0xA3,
        '∞' => 0xA5,
        '↔' => 0xAB,
        '←' => 0xAC,
        '↑' => 0xAD,
        '→' => 0xAE,
        '↓' => 0xAF,
        '≥' => 0xB3,
        '∂' => 0xB6,
        '≠' => 0xB9,
        '≡' => 0xBA,
        '≈' => 0xBB,
        '⋯' => 0xBC,
        '∅' => 0xC6,
        '∩' => 0xC7,
        '∪' => 0xC8,
        '⊃' => 0xC9,
        '⊇' => 0xCA,
        '⊂' => 0xCC,
        '⊆' => 0xCD,
        '∈' => 0xCE,
        '∉' => 0xCF,
        '∇' => 0xD1,
        '∏' => 0xD5,
        '√' => 0xD6,
        '¬' => 0xD8,
        '∧' => 0xD9,
        '∨' => 0xDA,
        '⇔' => 0xDB,
        '⇐' => 0xDC,
        '⇑' => 0xDD,
        '⇒' => 0xDE,
        '⇓' => 0xDF,
        '∑' => 0xE5,
        '∫' => 0xF2,
        _ => return None,
    })
}

fn dingbat_code(ch: char) -> Option<u8> {
    Some(match ch {
        '✓' => 0x33,
        '✔' | '☑' => 0x34,
        '✗' => 0x37,
        '✘' => 0x38,
        '☐' => 0x6F,
        _ => return None,
    })
}

// ── Advance widths (1/1000 em) ──────────────────────────────────────────────

/// Helvetica and Helvetica-Oblique, codes 32..=126.
const HELVETICA: [u16; 95] = [
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

/// Helvetica-Bold and Helvetica-BoldOblique, codes 32..=126.
const HELVETICA_BOLD: [u16; 95] = [
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

const COURIER_WIDTH: u16 = 600;

fn win_ansi_width(family: FontFamily, bold: bool, byte: u8) -> u16 {
    if family == FontFamily::Courier {
        return COURIER_WIDTH;
    }
    let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
    match byte {
        32..=126 => table[(byte - 32) as usize],
        0x85 | 0x97 | 0x99 => 1000,
        0x91 | 0x92 => {
            if bold {
                278
            } else {
                222
            }
        }
        0x93 | 0x94 => {
            if bold {
                500
            } else {
                333
            }
        }
        0x95 => 350,
        0xB0 => 400,
        0xB1 | 0xD7 | 0xF7 => 584,
        0xB7 => 278,
        _ => 556,
    }
}

fn symbol_width(byte: u8) -> u16 {
    match byte {
        b'a' => 631,
        b'b' | b'c' | b'l' | b'p' | b'r' => 549,
        b'g' => 411,
        b'd' | b'z' => 494,
        b'e' | b't' => 439,
        b'h' | b's' => 603,
        b'q' | b'f' => 521,
        b'i' => 329,
        b'k' => 549,
        b'm' => 576,
        b'n' | b'u' => 521,
        b'x' => 493,
        b'y' | b'w' => 686,
        b'G' => 603,
        b'D' => 612,
        b'Q' => 741,
        b'L' => 686,
        b'X' => 645,
        b'P' | b'W' => 768,
        b'S' => 592,
        b'F' => 763,
        b'Y' => 795,
        0xAB | 0xDB => 1042,
        0xAC | 0xAE | 0xDC | 0xDE => 987,
        0xAD | 0xAF | 0xDD | 0xDF => 603,
        0xA5 | 0xCE | 0xCF | 0xC9 | 0xCA | 0xCC | 0xCD | 0xE5 | 0x22 | 0xD1 => 713,
        0xC7 | 0xC8 => 768,
        0xC6 => 823,
        0xBC => 1000,
        0xB6 => 494,
        0xD5 => 823,
        0xF2 => 274,
        _ => 549,
    }
}

fn dingbat_width(byte: u8) -> u16 {
    match byte {
        0x33 => 834,
        0x34 => 760,
        0x37 => 691,
        0x38 => 776,
        0x6F => 761,
        _ => 788,
    }
}

/// Width of one encoded run in 1/1000 em.
pub fn run_units(run: &Run, family: FontFamily, style: FontStyle) -> u32 {
    run.bytes
        .iter()
        .map(|&b| {
            u32::from(match run.charset {
                Charset::WinAnsi => win_ansi_width(family, style.is_bold(), b),
                Charset::Symbol => symbol_width(b),
                Charset::Dingbats => dingbat_width(b),
            })
        })
        .sum()
}

/// Rendered width of `text` in points.
pub fn text_width(text: &str, family: FontFamily, style: FontStyle, size: f32) -> f32 {
    let units: u32 = encode_runs(text)
        .iter()
        .map(|run| run_units(run, family, style))
        .sum();
    units as f32 * size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_a_single_win_ansi_run() {
        let runs = encode_runs("Hello, world");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].charset, Charset::WinAnsi);
        assert_eq!(runs[0].bytes, b"Hello, world");
    }

    #[test]
    fn greek_switches_to_symbol_run() {
        let runs = encode_runs("α → β");
        let charsets: Vec<_> = runs.iter().map(|r| r.charset).collect();
        assert_eq!(
            charsets,
            vec![
                Charset::Symbol,
                Charset::WinAnsi,
                Charset::Symbol,
                Charset::WinAnsi,
                Charset::Symbol
            ]
        );
        assert_eq!(runs[0].bytes, b"a");
        assert_eq!(runs[2].bytes, vec![0xAE]);
    }

    #[test]
    fn bullet_and_checkboxes() {
        assert_eq!(encode_runs("•")[0].bytes, vec![0x95]);
        assert_eq!(encode_runs("☐")[0].charset, Charset::Dingbats);
        assert_eq!(encode_runs("☑")[0].charset, Charset::Dingbats);
    }

    #[test]
    fn unknown_becomes_question_mark() {
        let runs = encode_runs("漢");
        assert_eq!(runs[0].bytes, b"?");
    }

    #[test]
    fn helvetica_widths_match_afm() {
        // "Hi" = 722 + 222
        let w = text_width("Hi", FontFamily::Helvetica, FontStyle::Normal, 10.0);
        assert!((w - 9.44).abs() < 1e-4, "got {w}");
        let bold = text_width("Hi", FontFamily::Helvetica, FontStyle::Bold, 10.0);
        assert!(bold > w);
    }

    #[test]
    fn courier_is_monospaced() {
        let a = text_width("iiii", FontFamily::Courier, FontStyle::Normal, 10.0);
        let b = text_width("MMMM", FontFamily::Courier, FontStyle::Normal, 10.0);
        assert_eq!(a, b);
        assert!((a - 24.0).abs() < 1e-4);
    }
}
