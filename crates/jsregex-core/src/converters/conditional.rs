//! Conditionals `(?(1)yes|no)`.
//!
//! The target has no backreference-gated branch, so the first pass only
//! converts both branches and leaves a deferred marker; the second pass
//! expands the marker by enumerating group states.

use super::{convert_expression, unsupported};
use crate::ast::Expression;
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::Node;

pub fn convert(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    let resolved = expression
        .reference
        .as_ref()
        .map(|r| r.number)
        .filter(|&n| n > 0 && ctx.pattern().group(n).is_some());
    let Some(reference) = resolved else {
        return unsupported(expression, ctx);
    };
    if expression.children.is_empty() || expression.children.len() > 2 {
        return unsupported(expression, ctx);
    }

    ctx.descend();
    let branches = expression
        .children
        .iter()
        .map(|branch| convert_expression(branch, ctx))
        .collect::<Result<Vec<_>, _>>();
    ctx.ascend();

    Ok(Node::conditional(reference, branches?))
}
