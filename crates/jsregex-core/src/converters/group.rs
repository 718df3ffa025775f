//! Groups: capturing, named, passive, atomic, absence, options and comments.

use super::{
    backrefed_lookahead, build_group, convert_subexpressions, reserve_backrefed_lookahead,
    unsupported, warn_of_degradation, warn_of_unsupported_feature,
};
use crate::ast::{Expression, ExpressionKind, GroupKind, MatchLength};
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::{Child, Node};

const ANY: &str = r"[\s\S]";

pub fn convert(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    let ExpressionKind::Group(kind) = &expression.kind else {
        return unsupported(expression, ctx);
    };
    match kind {
        GroupKind::Capture { .. } => capture(expression, ctx, None),
        GroupKind::Named { name, .. } => {
            let name = ctx.target().supports_named_groups().then(|| name.clone());
            capture(expression, ctx, name)
        }
        GroupKind::Passive | GroupKind::Options => build_group("(?:", expression, ctx, ")"),
        GroupKind::Atomic => atomic(expression, ctx),
        GroupKind::Absence => absence(expression, ctx),
        GroupKind::OptionsSwitch | GroupKind::Comment => Ok(Node::dropped()),
        GroupKind::Unknown(_) => unsupported(expression, ctx),
    }
}

/// Groups for the reduced tier: no emulations, no names.
pub fn convert_basic(
    expression: &Expression,
    ctx: &mut Context<'_>,
) -> Result<Node, ConvertError> {
    match &expression.kind {
        ExpressionKind::Group(GroupKind::Capture { .. } | GroupKind::Named { .. }) => {
            capture(expression, ctx, None)
        }
        ExpressionKind::Group(GroupKind::Passive | GroupKind::Options) => {
            build_group("(?:", expression, ctx, ")")
        }
        ExpressionKind::Group(GroupKind::OptionsSwitch | GroupKind::Comment) => {
            Ok(Node::dropped())
        }
        _ => unsupported(expression, ctx),
    }
}

fn capture(
    expression: &Expression,
    ctx: &mut Context<'_>,
    name: Option<String>,
) -> Result<Node, ConvertError> {
    let Some(number) = expression.capture_number() else {
        return unsupported(expression, ctx);
    };
    ctx.capture_original_group();
    let content = convert_subexpressions(expression, ctx)?;
    Ok(Node::captured_group(content, number, name))
}

fn atomic(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    if ctx.in_atomic_group() {
        warn_of_degradation(
            expression,
            ctx,
            "Nested atomic group",
            "converted to a passive group",
        )?;
        return build_group("(?:", expression, ctx, ")");
    }

    let number = reserve_backrefed_lookahead(ctx);
    ctx.start_atomic_group();
    let content = convert_subexpressions(expression, ctx);
    ctx.end_atomic_group();
    Ok(backrefed_lookahead(
        content?,
        number,
        expression.quantifier.is_some(),
    ))
}

/// `(?~X)` matches any text that does not contain `X`.
///
/// For `X` of fixed length `n`, no position before the last `n - 1`
/// characters may start an `X`; the tail is too short to hold one.
fn absence(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    let length = expression
        .children
        .iter()
        .map(Expression::match_length)
        .try_fold(0usize, |total, length| {
            length
                .filter(MatchLength::is_fixed)
                .and_then(|length| total.checked_add(length.min))
        });
    let length = match length {
        Some(0) => return Ok(Node::text("(?!)")),
        Some(length) => length,
        None => {
            return warn_of_unsupported_feature(
                expression,
                ctx,
                Some("variable-length absence group"),
            )
        }
    };

    let mut children = vec![Child::from("(?:(?:(?!")];
    children.extend(convert_subexpressions(expression, ctx)?);
    children.push(Child::from(format!("){ANY})*")));
    if length > 1 {
        children.push(Child::from(format!("{ANY}{{0,{}}}", length - 1)));
    }
    children.push(Child::from(")"));
    Ok(Node::plain(children))
}
