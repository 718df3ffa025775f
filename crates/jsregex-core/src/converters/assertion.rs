//! Lookahead and lookbehind.

use super::{build_group, unsupported, warn_of_degradation, warn_of_unsupported_feature};
use crate::ast::{Expression, ExpressionKind, LookaroundKind};
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::{Child, Node};

pub fn convert(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    let ExpressionKind::Lookaround(kind) = &expression.kind else {
        return unsupported(expression, ctx);
    };
    let node = match kind {
        LookaroundKind::Lookahead => build_group("(?=", expression, ctx, ")")?,
        LookaroundKind::NegativeLookahead => build_group("(?!", expression, ctx, ")")?,
        LookaroundKind::Lookbehind if ctx.target().supports_lookbehind() => {
            build_group("(?<=", expression, ctx, ")")?
        }
        LookaroundKind::NegativeLookbehind if ctx.target().supports_lookbehind() => {
            build_group("(?<!", expression, ctx, ")")?
        }
        LookaroundKind::Lookbehind => {
            warn_of_degradation(
                expression,
                ctx,
                "Lookbehind",
                "converted to a passive group",
            )?;
            return build_group("(?:", expression, ctx, ")");
        }
        LookaroundKind::NegativeLookbehind | LookaroundKind::Unknown(_) => {
            return warn_of_unsupported_feature(expression, ctx, None)
        }
    };
    if expression.quantifier.is_some() {
        return Ok(Node::plain(vec![
            Child::from("(?:"),
            Child::Node(node),
            Child::from(")"),
        ]));
    }
    Ok(node)
}
