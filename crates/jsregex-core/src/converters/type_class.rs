//! Character types: `\d \w \s \h`, their negations, `\R` and `\X`.

use super::{
    atom_node, backrefed_lookahead, reserve_backrefed_lookahead, set, unsupported,
    warn_of_degradation,
};
use crate::ast::{Expression, ExpressionKind, TypeKind};
use crate::charset;
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::{Child, Node};

const LINEBREAK: &str = r"\r\n|[\n\v\f\r\u0085\u2028\u2029]";
const SURROGATE_PAIR: &str = r"[\uD800-\uDBFF][\uDC00-\uDFFF]";

pub fn convert(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    let ExpressionKind::Type(kind) = &expression.kind else {
        return unsupported(expression, ctx);
    };
    if expression.options.unicode_classes && !matches!(kind, TypeKind::Hex | TypeKind::NonHex) {
        if let Some(class) = set::type_class(kind, true) {
            return Ok(atom_node(set::serialize(&class, ctx), expression));
        }
    }

    let text = match kind {
        TypeKind::Digit => r"\d",
        TypeKind::NonDigit => r"\D",
        TypeKind::Word => r"\w",
        TypeKind::NonWord => r"\W",
        TypeKind::Space => r"[\t-\r ]",
        TypeKind::NonSpace => r"[^\t-\r ]",
        TypeKind::Hex => "[0-9A-Fa-f]",
        TypeKind::NonHex => "[^0-9A-Fa-f]",
        TypeKind::Linebreak => return Ok(atomic(LINEBREAK.to_string(), expression, ctx)),
        TypeKind::ExtendedGrapheme => return extended_grapheme(expression, ctx),
        TypeKind::Unknown(_) => return unsupported(expression, ctx),
    };
    Ok(Node::text(text))
}

/// Wrap `content` atomically, unless already inside an atomic group.
fn atomic(content: String, expression: &Expression, ctx: &mut Context<'_>) -> Node {
    if ctx.in_atomic_group() {
        return Node::text(format!("(?:{content})"));
    }
    let number = reserve_backrefed_lookahead(ctx);
    backrefed_lookahead(
        vec![Child::from(content)],
        number,
        expression.quantifier.is_some(),
    )
}

/// `\r\n`, or one base character followed by any combining marks.
fn extended_grapheme(
    expression: &Expression,
    ctx: &mut Context<'_>,
) -> Result<Node, ConvertError> {
    if ctx.target().supports_property_escapes() && ctx.enable_unicode_mode() {
        return Ok(atomic(r"\r\n|\P{M}\p{M}*".to_string(), expression, ctx));
    }

    let Some(marks) = charset::property("M") else {
        return unsupported(expression, ctx);
    };
    warn_of_degradation(
        expression,
        ctx,
        "Extended grapheme cluster",
        "approximated by a base character and combining marks",
    )?;
    let base = if ctx.target().is_utf16() {
        format!(r"(?:{SURROGATE_PAIR}|[\s\S])")
    } else {
        r"[\s\S]".to_string()
    };
    let marks = set::serialize(&marks, ctx);
    Ok(atomic(format!(r"\r\n|{base}{marks}*"), expression, ctx))
}
