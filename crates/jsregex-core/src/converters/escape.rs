//! Escape sequences.

use super::{atom_node, literal, unsupported};
use crate::ast::{EscapeKind, Expression, ExpressionKind};
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::Node;

pub fn convert(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    let ExpressionKind::Escape(kind) = &expression.kind else {
        return unsupported(expression, ctx);
    };
    let shared = match kind {
        EscapeKind::Tab => Some("\\t"),
        EscapeKind::Newline => Some("\\n"),
        EscapeKind::CarriageReturn => Some("\\r"),
        EscapeKind::FormFeed => Some("\\f"),
        EscapeKind::VerticalTab if ctx.target().is_ecmascript() => Some("\\v"),
        _ => None,
    };
    if let Some(text) = shared {
        return Ok(Node::text(text));
    }

    match kind {
        EscapeKind::Control(c) if c.is_ascii_alphabetic() => Ok(atom_node(
            format!("\\c{}", c.to_ascii_uppercase()),
            expression,
        )),
        EscapeKind::CodepointList(chars) => {
            let text: String = chars.iter().collect();
            literal::convert_text(&text, expression, ctx)
        }
        _ => match char_value(kind) {
            Some(c) => literal::convert_text(&c.to_string(), expression, ctx),
            None => unsupported(expression, ctx),
        },
    }
}

/// The single character an escape stands for, when it has one.
pub fn char_value(kind: &EscapeKind) -> Option<char> {
    let c = match kind {
        EscapeKind::Syntax(c)
        | EscapeKind::Hex(c)
        | EscapeKind::Octal(c)
        | EscapeKind::Codepoint(c)
        | EscapeKind::Literal(c) => *c,
        EscapeKind::Tab => '\t',
        EscapeKind::Newline => '\n',
        EscapeKind::CarriageReturn => '\r',
        EscapeKind::FormFeed => '\x0C',
        EscapeKind::VerticalTab => '\x0B',
        EscapeKind::Backspace => '\x08',
        EscapeKind::Bell => '\x07',
        EscapeKind::Escape => '\x1B',
        EscapeKind::Control(c) if c.is_ascii_alphabetic() => char::from(*c as u8 & 0x1F),
        EscapeKind::CodepointList(chars) if chars.len() == 1 => chars[0],
        EscapeKind::Control(_)
        | EscapeKind::CodepointList(_)
        | EscapeKind::MetaSequence
        | EscapeKind::MetaControlSequence
        | EscapeKind::Unknown(_) => return None,
    };
    Some(c)
}
