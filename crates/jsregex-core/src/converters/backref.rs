//! Backreferences and subexpression calls.

use super::{convert_expression, unsupported};
use crate::ast::{BackrefKind, Expression, ExpressionKind, GroupKind};
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::{Child, Node};
use crate::warning::WarningKind;

pub fn convert(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    let ExpressionKind::Backref(kind) = &expression.kind else {
        return unsupported(expression, ctx);
    };
    match kind {
        BackrefKind::Number | BackrefKind::NumberRelative | BackrefKind::Name => {
            convert_reference(expression, kind, ctx)
        }
        BackrefKind::Call => convert_call(expression, ctx),
        BackrefKind::RecursionLevel | BackrefKind::Unknown(_) => unsupported(expression, ctx),
    }
}

fn convert_reference(
    expression: &Expression,
    kind: &BackrefKind,
    ctx: &mut Context<'_>,
) -> Result<Node, ConvertError> {
    let Some(reference) = expression.reference.as_ref().filter(|r| r.number > 0) else {
        return unsupported(expression, ctx);
    };
    let number = ctx.new_capturing_group_position(reference.number);
    let name = match kind {
        BackrefKind::Name if ctx.target().supports_named_groups() => reference.name.clone(),
        _ => None,
    };
    Ok(Node::backref(number, name))
}

/// Inline the called group. Each call site may expand at most
/// `recursion_limit` times over the whole conversion.
fn convert_call(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    let Some(reference) = &expression.reference else {
        return unsupported(expression, ctx);
    };
    let Some(target) = ctx.pattern().group(reference.number) else {
        return unsupported(expression, ctx);
    };

    let limit = ctx.recursion_limit();
    if ctx.recursions(expression) >= limit {
        ctx.warn(
            WarningKind::Curtailed,
            Some(expression.span),
            format!(
                "Recursion for '{}' at index {} curtailed at {limit} levels",
                expression.full_text(),
                expression.span
            ),
        )?;
        return Ok(Node::dropped());
    }
    ctx.count_recursion(expression);

    let mut copy = target.unquantified_clone();
    strip_group_names(&mut copy);

    tracing::trace!(group = reference.number, depth = ctx.recursions(expression), "inlining call");
    ctx.start_subexp_call();
    let node = convert_expression(&copy, ctx);
    ctx.end_subexp_call();
    let node = node?;

    if reference.number == 0 {
        return Ok(Node::plain(vec![
            Child::from("(?:"),
            Child::Node(node),
            Child::from(")"),
        ]));
    }
    Ok(node)
}

/// Turn every named group in `expression` into a plain capture, so the
/// inlined copy does not declare a name twice.
fn strip_group_names(expression: &mut Expression) {
    if let ExpressionKind::Group(GroupKind::Named { number, .. }) = expression.kind {
        expression.kind = ExpressionKind::Group(GroupKind::Capture { number });
    }
    expression.children.iter_mut().for_each(strip_group_names);
}
