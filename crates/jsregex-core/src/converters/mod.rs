//! First pass: per-kind conversion rules and their dispatch.
//!
//! Every input node kind has one rule, looked up through a [`Registry`] built
//! for the target tier. A kind without a registered rule falls through to
//! [`unsupported`], which always drops the node and always warns, so nothing
//! is lost silently. Rules convert their children recursively through
//! [`convert_expression`] and touch shared state only through the
//! [`Context`].

use std::collections::HashMap;

use crate::ast::{Expression, ExpressionKind, Family, Quantifier, QuantifierMode};
use crate::config::Target;
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::{Child, Node, NodeKind};
use crate::warning::WarningKind;

pub mod anchor;
pub mod assertion;
pub mod backref;
pub mod conditional;
pub mod escape;
pub mod group;
pub mod keep;
pub mod literal;
pub mod meta;
pub mod property;
pub mod set;
pub mod type_class;

/// A conversion rule for one input kind.
pub type Converter = fn(&Expression, &mut Context<'_>) -> Result<Node, ConvertError>;

/// Conversion rules registered for a target tier.
#[derive(Debug, Clone)]
pub struct Registry {
    handlers: HashMap<Family, Converter>,
}

impl Registry {
    pub fn for_target(target: Target) -> Self {
        let mut handlers: HashMap<Family, Converter> = HashMap::new();
        handlers.insert(Family::Root, convert_sequence);
        handlers.insert(Family::Sequence, convert_sequence);
        handlers.insert(Family::Anchor, anchor::convert);
        handlers.insert(Family::Escape, escape::convert);
        handlers.insert(Family::FreeSpace, drop_without_warning);
        handlers.insert(Family::Literal, literal::convert);
        handlers.insert(Family::Meta, meta::convert);
        handlers.insert(Family::Set, set::convert);
        handlers.insert(Family::Type, type_class::convert);

        if target.is_ecmascript() {
            handlers.insert(Family::Backref, backref::convert);
            handlers.insert(Family::Conditional, conditional::convert);
            handlers.insert(Family::Group, group::convert);
            handlers.insert(Family::Keep, keep::convert);
            handlers.insert(Family::Lookaround, assertion::convert);
            handlers.insert(Family::PosixClass, property::convert);
            handlers.insert(Family::Property, property::convert);
        } else {
            handlers.insert(Family::Group, group::convert_basic);
        }
        Self { handlers }
    }

    /// The rule for `family`, or [`unsupported`] when none is registered.
    pub fn get(&self, family: Family) -> Converter {
        self.handlers.get(&family).copied().unwrap_or(unsupported)
    }

    pub fn supports(&self, family: Family) -> bool {
        self.handlers.contains_key(&family)
    }
}

/// Convert one input node, including its quantifier.
pub fn convert_expression(
    expression: &Expression,
    ctx: &mut Context<'_>,
) -> Result<Node, ConvertError> {
    let family = expression.kind.family();
    tracing::trace!(kind = family.name(), text = %expression.text, "converting");

    let possessive = expression
        .quantifier
        .as_ref()
        .is_some_and(Quantifier::is_possessive);
    let emulated = possessive && can_emulate_possessive(expression, ctx);
    let possessive_group = emulated.then(|| reserve_backrefed_lookahead(ctx));
    if emulated {
        ctx.start_atomic_group();
    }

    let handler = ctx.handler(family);
    let node = handler(expression, ctx);

    if emulated {
        ctx.end_atomic_group();
    }
    let node = node?;
    if node.is_dropped() {
        if possessive_group.is_some() {
            ctx.release_local_capturing_group();
        }
        return Ok(node);
    }
    if possessive && !emulated {
        warn_of_degradation(
            expression,
            ctx,
            "Possessive quantifier on",
            "converted to greedy",
        )?;
    }
    let node = apply_quantifier(node, expression, ctx)?;

    Ok(match possessive_group {
        Some(number) => backrefed_lookahead(vec![Child::Node(node)], number, false),
        None => node,
    })
}

/// Convert all children of `expression`, in order.
pub fn convert_subexpressions(
    expression: &Expression,
    ctx: &mut Context<'_>,
) -> Result<Vec<Child>, ConvertError> {
    ctx.descend();
    let result = convert_children(&expression.children, ctx);
    ctx.ascend();
    result
}

fn convert_children(
    children: &[Expression],
    ctx: &mut Context<'_>,
) -> Result<Vec<Child>, ConvertError> {
    let mut converted = Vec::with_capacity(children.len());
    let mut after_backref = false;
    for child in children {
        let node = convert_expression(child, ctx)?;
        let Some(first) = first_rendered_char(&node) else {
            converted.push(Child::Node(node));
            continue;
        };
        if after_backref && first.is_ascii_digit() {
            // keep `\1` + `0` from reading as `\10`
            converted.push(Child::from("(?:)"));
        }
        after_backref = ends_with_backref(&node);
        converted.push(Child::Node(node));
    }
    Ok(converted)
}

/// First character `node` renders to, or `None` when it renders empty.
fn first_rendered_char(node: &Node) -> Option<char> {
    match node.kind {
        NodeKind::Dropped => None,
        NodeKind::Backref => Some('\\'),
        NodeKind::CapturedGroup | NodeKind::Conditional | NodeKind::KeepMark => Some('('),
        NodeKind::Plain => node.children.iter().find_map(|child| match child {
            Child::Text(text) => text.chars().next(),
            Child::Node(inner) => first_rendered_char(inner),
        }),
    }
}

/// Whether `node` renders with an unquantified numeric or named
/// backreference at its end.
fn ends_with_backref(node: &Node) -> bool {
    if node.quantifier.is_some() {
        return false;
    }
    match node.kind {
        NodeKind::Backref => true,
        NodeKind::Plain => node
            .children
            .iter()
            .rev()
            .find_map(|child| match child {
                Child::Text(text) if text.is_empty() => None,
                Child::Text(_) => Some(false),
                Child::Node(inner) => {
                    first_rendered_char(inner).map(|_| ends_with_backref(inner))
                }
            })
            .unwrap_or(false),
        _ => false,
    }
}

/// Root and alternative branches: the concatenation of their children.
pub fn convert_sequence(
    expression: &Expression,
    ctx: &mut Context<'_>,
) -> Result<Node, ConvertError> {
    Ok(Node::plain(convert_subexpressions(expression, ctx)?))
}

/// Default rule: drop the node and warn.
pub fn unsupported(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    warn_of_unsupported_feature(expression, ctx, None)
}

pub fn drop_without_warning(
    _expression: &Expression,
    _ctx: &mut Context<'_>,
) -> Result<Node, ConvertError> {
    Ok(Node::dropped())
}

/// Drop `expression` with a warning naming it, its kind and its position.
pub fn warn_of_unsupported_feature(
    expression: &Expression,
    ctx: &mut Context<'_>,
    description: Option<&str>,
) -> Result<Node, ConvertError> {
    let description = description.map(str::to_string).unwrap_or_else(|| {
        format!(
            "{} {}",
            expression.kind.subtype_name(),
            expression.kind.family().name()
        )
    });
    ctx.warn(
        WarningKind::Dropped,
        Some(expression.span),
        format!(
            "Dropped unsupported {description} '{}' at index {}",
            expression.full_text(),
            expression.span
        ),
    )?;
    Ok(Node::dropped())
}

/// Record a degradation: `<subject> '<text>' at index a..b <outcome>`.
pub fn warn_of_degradation(
    expression: &Expression,
    ctx: &mut Context<'_>,
    subject: &str,
    outcome: &str,
) -> Result<(), ConvertError> {
    ctx.warn(
        WarningKind::Degraded,
        Some(expression.span),
        format!(
            "{subject} '{}' at index {} {outcome}",
            expression.full_text(),
            expression.span
        ),
    )
}

/// `head`, the converted children, `tail`.
pub fn build_group(
    head: &str,
    expression: &Expression,
    ctx: &mut Context<'_>,
    tail: &str,
) -> Result<Node, ConvertError> {
    let mut children = vec![Child::from(head)];
    children.extend(convert_subexpressions(expression, ctx)?);
    children.push(Child::from(tail));
    Ok(Node::plain(children))
}

/// Number a synthetic capturing group for a lookahead+backreference
/// emulation and record its injection.
///
/// Must be called before the wrapped content is converted, because the
/// synthetic group opens before any group inside that content.
pub fn reserve_backrefed_lookahead(ctx: &mut Context<'_>) -> usize {
    let number = ctx.capturing_group_count() + 1;
    ctx.increment_local_capturing_group_count();
    number
}

/// `(?=(content))\N(?:)`: matches what `content` matches, atomically.
///
/// The capture inside the lookahead freezes the first match; the
/// backreference consumes it, and backtracking cannot re-enter the
/// lookahead. The trailing empty group keeps a following digit or
/// quantifier from attaching to the backreference. With `quantifiable` the
/// whole construct is wrapped so an outer quantifier applies to all of it.
pub fn backrefed_lookahead(content: Vec<Child>, number: usize, quantifiable: bool) -> Node {
    let mut children = vec![Child::from("(?=(")];
    children.extend(content);
    children.push(Child::from("))"));
    children.push(Child::Node(Node::backref(number, None)));
    children.push(Child::from("(?:)"));
    if quantifiable {
        children.insert(0, Child::from("(?:"));
        children.push(Child::from(")"));
    }
    Node::plain(children)
}

/// A plain node for `text`, wrapped in a passive group when the expression
/// is quantified and `text` is not a single atom.
pub fn atom_node(text: String, expression: &Expression) -> Node {
    if expression.quantifier.is_some() && !is_single_atom(&text) {
        Node::text(format!("(?:{text})"))
    } else {
        Node::text(text)
    }
}

/// Whether `text` is exactly one quantifiable unit of pattern syntax.
pub fn is_single_atom(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let consumed = match first {
        '\\' => escape_length(text),
        '[' => bracket_length(text),
        '(' => group_length(text),
        c => Some(c.len_utf8()),
    };
    consumed == Some(text.len())
}

fn escape_length(text: &str) -> Option<usize> {
    let rest = text.get(1..)?;
    let next = rest.chars().next()?;
    let braced = |open: char, close: char| {
        rest[1..]
            .starts_with(open)
            .then(|| rest.find(close).map(|end| 1 + end + 1))
            .flatten()
    };
    match next {
        'u' => braced('{', '}').or_else(|| {
            rest.get(1..5)
                .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
                .map(|_| 6)
        }),
        'x' => braced('{', '}').or_else(|| {
            rest.get(1..3)
                .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
                .map(|_| 4)
        }),
        'p' | 'P' => braced('{', '}'),
        'k' => braced('<', '>'),
        'c' => rest.get(1..2).map(|_| 3),
        d if d.is_ascii_digit() => {
            Some(1 + rest.chars().take_while(|c| c.is_ascii_digit()).count())
        }
        c => Some(1 + c.len_utf8()),
    }
}

fn bracket_length(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (index, c) in text.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ']' if index > 1 => return Some(index + 1),
            _ => {}
        }
    }
    None
}

fn group_length(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    let mut in_brackets = false;
    for (index, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '[' if !in_brackets => in_brackets = true,
            ']' if in_brackets => in_brackets = false,
            '(' if !in_brackets => depth += 1,
            ')' if !in_brackets => {
                depth -= 1;
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Whether a possessive quantifier on `expression` can be emulated with a
/// lookahead; otherwise it is downgraded to greedy.
fn can_emulate_possessive(expression: &Expression, ctx: &Context<'_>) -> bool {
    let single_unit = match &expression.kind {
        ExpressionKind::Literal => expression.text.chars().count() == 1,
        ExpressionKind::Keep | ExpressionKind::Anchor(_) => false,
        _ => true,
    };
    ctx.target().is_ecmascript() && single_unit && !ctx.in_atomic_group()
}

/// Attach the input quantifier to `node`, rewritten for the target.
pub fn apply_quantifier(
    mut node: Node,
    expression: &Expression,
    ctx: &mut Context<'_>,
) -> Result<Node, ConvertError> {
    let Some(quantifier) = &expression.quantifier else {
        return Ok(node);
    };
    if node.is_dropped() {
        return Ok(node);
    }

    let mut text = quantifier.text.clone();
    if let Some((first, rest)) = split_interval_chain(&text) {
        ctx.warn(
            WarningKind::Degraded,
            Some(expression.span),
            format!(
                "Dropped chained quantifier '{rest}' after '{first}' at index {}",
                expression.span
            ),
        )?;
        text = first;
    }
    if quantifier.is_possessive() {
        text.pop();
    }
    if let Some(upper) = text.strip_prefix("{,") {
        text = format!("{{0,{upper}");
    }

    node.quantifier = Some(Quantifier {
        min: quantifier.min,
        max: quantifier.max,
        mode: match quantifier.mode {
            QuantifierMode::Possessive => QuantifierMode::Greedy,
            mode => mode,
        },
        text,
    });
    Ok(node)
}

/// Split `{2}{3}` into its first interval (with any mode suffix) and the rest.
fn split_interval_chain(text: &str) -> Option<(String, String)> {
    if !text.starts_with('{') {
        return None;
    }
    let close = text.find('}')?;
    let mut end = close + 1;
    if matches!(text[end..].chars().next(), Some('?' | '+')) && !text[end..].starts_with("+{") {
        end += 1;
    }
    let rest = &text[end..];
    rest.starts_with('{')
        .then(|| (text[..end].to_string(), rest.to_string()))
}
