//! Line, string and word-boundary anchors.

use super::{unsupported, warn_of_degradation};
use crate::ast::{AnchorKind, Expression, ExpressionKind};
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::Node;

/// Word characters of the source dialect, as a property-escape class.
const WORD: &str = r"[\p{L}\p{M}\p{Nd}\p{Pc}]";

pub fn convert(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    let ExpressionKind::Anchor(kind) = &expression.kind else {
        return unsupported(expression, ctx);
    };
    let text = match kind {
        AnchorKind::BeginningOfLine | AnchorKind::BeginningOfString => "^".to_string(),
        AnchorKind::EndOfLine | AnchorKind::EndOfString => "$".to_string(),
        AnchorKind::EndOfStringOrBeforeEndOfLine => r"(?=\n?$)".to_string(),
        AnchorKind::WordBoundary => word_boundary(expression, ctx, false)?,
        AnchorKind::NonwordBoundary => word_boundary(expression, ctx, true)?,
        AnchorKind::MatchStart | AnchorKind::Unknown(_) => return unsupported(expression, ctx),
    };
    Ok(quantifiable(text, expression))
}

fn word_boundary(
    expression: &Expression,
    ctx: &mut Context<'_>,
    negated: bool,
) -> Result<String, ConvertError> {
    if !ctx.target().supports_property_escapes() || !ctx.enable_unicode_mode() {
        warn_of_degradation(
            expression,
            ctx,
            "Word boundary",
            "only detects ASCII word boundaries",
        )?;
        return Ok(if negated { r"\B" } else { r"\b" }.to_string());
    }
    Ok(if negated {
        format!("(?:(?<={WORD})(?={WORD})|(?<!{WORD})(?!{WORD}))")
    } else {
        format!("(?:(?<={WORD})(?!{WORD})|(?<!{WORD})(?={WORD}))")
    })
}

/// Assertions cannot take a quantifier directly in every target mode.
fn quantifiable(text: String, expression: &Expression) -> Node {
    if expression.quantifier.is_some() {
        Node::text(format!("(?:{text})"))
    } else {
        Node::text(text)
    }
}
