//! Codepoint-set algebra and bracket-expression serialization.
//!
//! Set arithmetic is delegated to `regex-syntax`'s `ClassUnicode`, which also
//! knows the Unicode property tables. This module adds the source-dialect
//! class definitions and serializes a set back into target pattern text,
//! splitting astral ranges into surrogate-pair alternatives when the target
//! matches UTF-16 code units.

use regex_syntax::hir::{Class, ClassUnicode, ClassUnicodeRange, HirKind};
use regex_syntax::ParserBuilder;

const ASTRAL_START: u32 = 0x10000;

/// How a serialized set must spell characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// ECMAScript without the `u` flag: astral ranges become surrogate pairs.
    Utf16,
    /// ECMAScript with the `u` flag: `\u{1F600}`.
    CodePoints,
    /// PCRE-style: `\x{1F600}`.
    Pcre,
}

pub fn empty() -> ClassUnicode {
    ClassUnicode::empty()
}

pub fn range(start: char, end: char) -> ClassUnicode {
    ClassUnicode::new([ClassUnicodeRange::new(start, end)])
}

pub fn single(c: char) -> ClassUnicode {
    range(c, c)
}

pub fn union(mut left: ClassUnicode, right: &ClassUnicode) -> ClassUnicode {
    left.union(right);
    left
}

pub fn negated(mut class: ClassUnicode) -> ClassUnicode {
    class.negate();
    class
}

/// Simple case folding closure of `class`.
pub fn case_folded(mut class: ClassUnicode) -> ClassUnicode {
    if class.try_case_fold_simple().is_err() {
        tracing::warn!("case folding tables unavailable, set left unfolded");
    }
    class
}

/// Parse a class written in `regex-syntax` notation, e.g. `\p{Greek}`.
pub fn parse_class(source: &str) -> Option<ClassUnicode> {
    let hir = ParserBuilder::new().build().parse(source).ok()?;
    match hir.kind() {
        HirKind::Class(Class::Unicode(class)) => Some(class.clone()),
        HirKind::Literal(literal) => {
            let text = std::str::from_utf8(&literal.0).ok()?;
            let mut chars = text.chars();
            let c = chars.next()?;
            chars.next().is_none().then(|| single(c))
        }
        _ => None,
    }
}

/// Codepoints of a Unicode property by any name `regex-syntax` accepts.
pub fn property(name: &str) -> Option<ClassUnicode> {
    if name.is_empty() || name.contains(['{', '}', '\\']) {
        return None;
    }
    parse_class(&format!("\\p{{{name}}}"))
}

pub fn ascii_digit() -> ClassUnicode {
    range('0', '9')
}

pub fn ascii_word() -> ClassUnicode {
    ClassUnicode::new([
        ClassUnicodeRange::new('0', '9'),
        ClassUnicodeRange::new('A', 'Z'),
        ClassUnicodeRange::new('_', '_'),
        ClassUnicodeRange::new('a', 'z'),
    ])
}

/// Source-dialect `\s`: tab through carriage return, and space.
pub fn ascii_space() -> ClassUnicode {
    ClassUnicode::new([
        ClassUnicodeRange::new('\t', '\r'),
        ClassUnicodeRange::new(' ', ' '),
    ])
}

pub fn hex_digit() -> ClassUnicode {
    ClassUnicode::new([
        ClassUnicodeRange::new('0', '9'),
        ClassUnicodeRange::new('A', 'F'),
        ClassUnicodeRange::new('a', 'f'),
    ])
}

pub fn unicode_digit() -> Option<ClassUnicode> {
    property("Nd")
}

pub fn unicode_space() -> Option<ClassUnicode> {
    property("White_Space")
}

pub fn unicode_word() -> Option<ClassUnicode> {
    let mut word = property("Alphabetic")?;
    for name in ["M", "Nd", "Pc"] {
        word.union(&property(name)?);
    }
    Some(word)
}

/// Codepoints of a POSIX bracket class (`[:alpha:]`) or the same-named
/// source-dialect property (`\p{Alpha}`), using Unicode definitions.
pub fn posix_class(name: &str) -> Option<ClassUnicode> {
    let class = match name.to_ascii_lowercase().as_str() {
        "alpha" => property("Alphabetic")?,
        "digit" => unicode_digit()?,
        "alnum" => union(property("Alphabetic")?, &unicode_digit()?),
        "upper" => property("Uppercase")?,
        "lower" => property("Lowercase")?,
        "space" => unicode_space()?,
        "blank" => union(property("Zs")?, &single('\t')),
        "cntrl" => property("Cc")?,
        "punct" => {
            let mut punct = property("P")?;
            for c in ['$', '+', '<', '=', '>', '^', '`', '|', '~'] {
                punct.push(ClassUnicodeRange::new(c, c));
            }
            punct
        }
        "xdigit" => hex_digit(),
        "word" => unicode_word()?,
        "ascii" => range('\0', '\x7F'),
        "graph" => negated(non_graphic()?),
        "print" => union(negated(non_graphic()?), &property("Zs")?),
        _ => return None,
    };
    Some(class)
}

fn non_graphic() -> Option<ClassUnicode> {
    let mut class = unicode_space()?;
    class.union(&property("Cc")?);
    class.union(&property("Cn")?);
    Some(class)
}

/// Whether any codepoint lies outside the Basic Multilingual Plane.
pub fn spans_astral(class: &ClassUnicode) -> bool {
    class
        .ranges()
        .last()
        .is_some_and(|r| r.end() as u32 >= ASTRAL_START)
}

/// Serialize `class` as pattern text matching exactly one of its members.
///
/// With `Encoding::Utf16` the result may be an alternation of a bracket
/// expression and surrogate-pair sequences.
pub fn to_pattern(class: &ClassUnicode, encoding: Encoding) -> String {
    if class.ranges().is_empty() {
        return "(?!)".to_string();
    }
    if encoding != Encoding::Utf16 || !spans_astral(class) {
        let body: String = class
            .ranges()
            .iter()
            .map(|r| range_text(r.start() as u32, r.end() as u32, encoding))
            .collect();
        return format!("[{body}]");
    }

    let mut bmp = String::new();
    let mut alternatives = Vec::new();
    for r in class.ranges() {
        let (start, end) = (r.start() as u32, r.end() as u32);
        if end < ASTRAL_START {
            bmp.push_str(&range_text(start, end, encoding));
            continue;
        }
        if start < ASTRAL_START {
            bmp.push_str(&range_text(start, ASTRAL_START - 1, encoding));
        }
        alternatives.extend(surrogate_alternatives(start.max(ASTRAL_START), end));
    }
    if !bmp.is_empty() {
        alternatives.insert(0, format!("[{bmp}]"));
    }
    format!("(?:{})", alternatives.join("|"))
}

fn range_text(start: u32, end: u32, encoding: Encoding) -> String {
    match end - start {
        0 => escape_class_char(start, encoding),
        1 => format!(
            "{}{}",
            escape_class_char(start, encoding),
            escape_class_char(end, encoding)
        ),
        _ => format!(
            "{}-{}",
            escape_class_char(start, encoding),
            escape_class_char(end, encoding)
        ),
    }
}

/// Escape a codepoint for use inside a bracket expression.
pub fn escape_class_char(cp: u32, encoding: Encoding) -> String {
    match char::from_u32(cp) {
        Some(c @ ('\\' | ']' | '[' | '^' | '-' | '/')) => format!("\\{c}"),
        Some(c) if c.is_ascii_graphic() || c == ' ' => c.to_string(),
        _ => codepoint_escape(cp, encoding),
    }
}

/// `\xHH`, `\uHHHH`, `\u{HHHHH}` or `\x{HHHHH}` as the encoding allows.
pub fn codepoint_escape(cp: u32, encoding: Encoding) -> String {
    match encoding {
        Encoding::Pcre if cp > 0xFF => format!("\\x{{{cp:X}}}"),
        Encoding::CodePoints if cp > 0xFFFF => format!("\\u{{{cp:X}}}"),
        _ if cp <= 0xFF => format!("\\x{cp:02X}"),
        _ => format!("\\u{cp:04X}"),
    }
}

/// High and low surrogate of an astral codepoint.
pub fn surrogate_pair(cp: u32) -> (u32, u32) {
    let offset = cp - ASTRAL_START;
    (0xD800 + (offset >> 10), 0xDC00 + (offset & 0x3FF))
}

fn surrogate_alternatives(start: u32, end: u32) -> Vec<String> {
    let (start_high, start_low) = surrogate_pair(start);
    let (end_high, end_low) = surrogate_pair(end);
    let unit = |cp: u32| format!("\\u{cp:04X}");
    let units = |from: u32, to: u32| {
        if from == to {
            unit(from)
        } else {
            format!("[{}-{}]", unit(from), unit(to))
        }
    };

    if start_high == end_high {
        return vec![format!("{}{}", unit(start_high), units(start_low, end_low))];
    }

    let mut parts = Vec::new();
    let mut full_from = start_high;
    let mut full_to = end_high;
    if start_low > 0xDC00 {
        parts.push(format!("{}{}", unit(start_high), units(start_low, 0xDFFF)));
        full_from += 1;
    }
    let tail = (end_low < 0xDFFF).then(|| {
        full_to -= 1;
        format!("{}{}", unit(end_high), units(0xDC00, end_low))
    });
    if full_from <= full_to {
        parts.push(format!("{}{}", units(full_from, full_to), units(0xDC00, 0xDFFF)));
    }
    parts.extend(tail);
    parts
}
