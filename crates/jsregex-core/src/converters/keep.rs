//! `\K`: only resolvable at the top level, where the second pass turns
//! everything before it into a lookbehind.

use super::warn_of_unsupported_feature;
use crate::ast::Expression;
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::Node;

pub fn convert(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    if ctx.target().supports_lookbehind() && ctx.depth() == 1 {
        return Ok(Node::keep_mark());
    }
    warn_of_unsupported_feature(expression, ctx, None)
}
