//! `.` and `|`.

use super::{convert_expression, unsupported};
use crate::ast::{Expression, ExpressionKind, MetaKind};
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::{Child, Node};

const SURROGATE_PAIR: &str = r"[\uD800-\uDBFF][\uDC00-\uDFFF]";

pub fn convert(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    match &expression.kind {
        ExpressionKind::Meta(MetaKind::Dot) => Ok(Node::text(dot(expression, ctx))),
        ExpressionKind::Meta(MetaKind::Alternation) => alternation(expression, ctx),
        _ => unsupported(expression, ctx),
    }
}

/// The source dot excludes only `\n`, and in multiline mode nothing.
fn dot(expression: &Expression, ctx: &Context<'_>) -> String {
    let any = if expression.options.multiline {
        r"[\s\S]"
    } else {
        r"[^\n]"
    };
    if !ctx.target().is_utf16() {
        return any.to_string();
    }
    format!("(?:{SURROGATE_PAIR}|{any})")
}

fn alternation(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    ctx.descend();
    let mut children = Vec::with_capacity(expression.children.len() * 2);
    for branch in &expression.children {
        let node = match convert_expression(branch, ctx) {
            Ok(node) => node,
            Err(err) => {
                ctx.ascend();
                return Err(err);
            }
        };
        if node.is_dropped() || node.is_entirely_dropped() {
            continue;
        }
        if !children.is_empty() {
            children.push(Child::from("|"));
        }
        children.push(Child::Node(node));
    }
    ctx.ascend();
    Ok(Node::plain(children))
}
