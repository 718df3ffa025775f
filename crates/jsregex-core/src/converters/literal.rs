//! Literal text, and the escapes whose value is a plain character.

use super::{atom_node, warn_of_degradation};
use crate::ast::Expression;
use crate::charset::{self, Encoding};
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::Node;

/// Characters with syntactic meaning in the target, plus the literal delimiter.
const SYNTAX_CHARS: &[char] = &[
    '^', '$', '\\', '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '/',
];

pub fn convert(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    convert_text(&expression.text, expression, ctx)
}

/// Convert `text` as literal characters, under `expression`'s options.
pub fn convert_text(
    text: &str,
    expression: &Expression,
    ctx: &mut Context<'_>,
) -> Result<Node, ConvertError> {
    let local_ci = expression.options.case_insensitive;
    let root_ci = ctx.case_insensitive_root();
    if root_ci && !local_ci && text.chars().any(has_case) {
        warn_of_degradation(
            expression,
            ctx,
            "Case-sensitive text",
            "is matched case-insensitively",
        )?;
    }

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match swapped_case(c).filter(|_| local_ci && !root_ci) {
            Some(swapped) => {
                let (original, swapped) = (escape_char(c, ctx), escape_char(swapped, ctx));
                out.push_str(&format!("(?:{original}|{swapped})"));
            }
            None => out.push_str(&escape_char(c, ctx)),
        }
    }
    Ok(atom_node(out, expression))
}

/// Spell one character for the target.
pub fn escape_char(c: char, ctx: &mut Context<'_>) -> String {
    let cp = c as u32;
    if SYNTAX_CHARS.contains(&c) {
        return format!("\\{c}");
    }
    if !ctx.target().is_utf16() {
        return if is_nonprintable(c) {
            charset::codepoint_escape(cp, Encoding::Pcre)
        } else {
            c.to_string()
        };
    }
    if cp > 0xFFFF {
        if ctx.enable_unicode_mode() {
            return c.to_string();
        }
        let (high, low) = charset::surrogate_pair(cp);
        return format!("\\u{high:04X}\\u{low:04X}");
    }
    if is_nonprintable(c) {
        charset::codepoint_escape(cp, Encoding::Utf16)
    } else {
        c.to_string()
    }
}

fn has_case(c: char) -> bool {
    swapped_case(c).is_some()
}

fn swapped_case(c: char) -> Option<char> {
    let swapped: String = if c.is_lowercase() {
        c.to_uppercase().collect()
    } else if c.is_uppercase() {
        c.to_lowercase().collect()
    } else {
        return None;
    };
    let mut chars = swapped.chars();
    let first = chars.next()?;
    (chars.next().is_none() && first != c).then_some(first)
}

fn is_nonprintable(c: char) -> bool {
    c.is_control()
        || (c.is_whitespace() && c != ' ')
        || matches!(
            c,
            '\u{AD}' | '\u{200B}'..='\u{200F}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
        )
}
