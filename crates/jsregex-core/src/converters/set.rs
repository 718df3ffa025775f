//! Bracket expressions.
//!
//! A set whose members are all plain characters, ranges and the classes the
//! target shares is rebuilt member by member, keeping the source layout.
//! Anything else (nested sets, intersections, POSIX classes, properties,
//! astral members, local case folding) is computed as an explicit codepoint
//! set and serialized fresh.

use regex_syntax::hir::ClassUnicode;

use super::{atom_node, escape, unsupported, warn_of_unsupported_feature};
use crate::ast::{EscapeKind, Expression, ExpressionKind, SetKind, TypeKind};
use crate::charset::{self, Encoding};
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::Node;

pub fn convert(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    let ExpressionKind::Set(SetKind::Character { negated }) = &expression.kind else {
        return unsupported(expression, ctx);
    };
    let fold = expression.options.case_insensitive && !ctx.case_insensitive_root();

    if !fold {
        if let Some(text) = rebuild(expression, *negated, ctx) {
            return Ok(Node::text(text));
        }
    }

    let mut class = members_class(expression, ctx)?;
    if fold {
        class = charset::case_folded(class);
    }
    if *negated {
        class = charset::negated(class);
    }
    Ok(atom_node(serialize(&class, ctx), expression))
}

/// Serialize `class` for the target, switching on extended-codepoint mode
/// when it holds astral codepoints and the target allows it.
pub fn serialize(class: &ClassUnicode, ctx: &mut Context<'_>) -> String {
    let encoding = if !ctx.target().is_utf16() {
        Encoding::Pcre
    } else if ctx.unicode_mode() || (charset::spans_astral(class) && ctx.enable_unicode_mode())
    {
        Encoding::CodePoints
    } else {
        Encoding::Utf16
    };
    charset::to_pattern(class, encoding)
}

fn encoding_for_rebuild(ctx: &Context<'_>) -> Encoding {
    if ctx.target().is_utf16() {
        Encoding::Utf16
    } else {
        Encoding::Pcre
    }
}

/// Member-by-member reconstruction, or `None` if any member needs computing.
fn rebuild(expression: &Expression, negated: bool, ctx: &Context<'_>) -> Option<String> {
    let encoding = encoding_for_rebuild(ctx);
    let mut body = String::new();
    for member in &expression.children {
        match &member.kind {
            ExpressionKind::Set(SetKind::Range) => {
                let [start, end] = member.children.as_slice() else {
                    return None;
                };
                let (start, end) = (simple_char(start)?, simple_char(end)?);
                if start > end {
                    return None;
                }
                body.push_str(&charset::escape_class_char(start as u32, encoding));
                body.push('-');
                body.push_str(&charset::escape_class_char(end as u32, encoding));
            }
            ExpressionKind::Type(kind) if !member.options.unicode_classes => match kind {
                TypeKind::Digit => body.push_str("\\d"),
                TypeKind::NonDigit => body.push_str("\\D"),
                TypeKind::Word => body.push_str("\\w"),
                TypeKind::NonWord => body.push_str("\\W"),
                _ => return None,
            },
            _ => {
                let c = simple_char(member)?;
                body.push_str(&charset::escape_class_char(c as u32, encoding));
            }
        }
    }
    if body.is_empty() {
        return None;
    }
    let caret = if negated { "^" } else { "" };
    Some(format!("[{caret}{body}]"))
}

/// A single basic-plane character member.
fn simple_char(member: &Expression) -> Option<char> {
    let c = match &member.kind {
        ExpressionKind::Literal => {
            let mut chars = member.text.chars();
            let c = chars.next()?;
            chars.next().is_none().then_some(c)?
        }
        ExpressionKind::Escape(kind) => escape::char_value(kind)?,
        _ => return None,
    };
    ((c as u32) < 0x10000).then_some(c)
}

/// Union of all members of a bracket expression or intersection operand.
fn members_class(
    expression: &Expression,
    ctx: &mut Context<'_>,
) -> Result<ClassUnicode, ConvertError> {
    let mut class = charset::empty();
    for member in &expression.children {
        if let Some(member_class) = member_class(member, ctx)? {
            class.union(&member_class);
        }
    }
    Ok(class)
}

/// Codepoints of one member, or `None` (with a warning) if it has no set
/// meaning in the target.
fn member_class(
    member: &Expression,
    ctx: &mut Context<'_>,
) -> Result<Option<ClassUnicode>, ConvertError> {
    let class = match &member.kind {
        ExpressionKind::Literal => {
            let mut class = charset::empty();
            for c in member.text.chars() {
                class.union(&charset::single(c));
            }
            Some(class)
        }
        ExpressionKind::Escape(EscapeKind::CodepointList(chars)) => {
            let mut class = charset::empty();
            for &c in chars {
                class.union(&charset::single(c));
            }
            Some(class)
        }
        ExpressionKind::Escape(kind) => escape::char_value(kind).map(charset::single),
        ExpressionKind::Set(SetKind::Range) => range_class(member),
        ExpressionKind::Set(SetKind::Character { negated }) => {
            let mut class = members_class(member, ctx)?;
            if member.options.case_insensitive && !ctx.case_insensitive_root() {
                class = charset::case_folded(class);
            }
            Some(if *negated {
                charset::negated(class)
            } else {
                class
            })
        }
        ExpressionKind::Set(SetKind::Intersection) => {
            let mut operands = Vec::with_capacity(member.children.len());
            for operand in &member.children {
                operands.push(members_class(operand, ctx)?);
            }
            operands.into_iter().reduce(|mut left, right| {
                left.intersect(&right);
                left
            })
        }
        ExpressionKind::Sequence => Some(members_class(member, ctx)?),
        ExpressionKind::Type(kind) => type_class(kind, member.options.unicode_classes),
        ExpressionKind::PosixClass { name, negated } => {
            charset::posix_class(name).map(|class| negate_if(class, *negated))
        }
        ExpressionKind::Property { name, negated } => charset::posix_class(name)
            .or_else(|| charset::property(name))
            .map(|class| negate_if(class, *negated)),
        _ => None,
    };
    if class.is_none() {
        warn_of_unsupported_feature(member, ctx, None)?;
    }
    Ok(class)
}

fn range_class(range: &Expression) -> Option<ClassUnicode> {
    let [start, end] = range.children.as_slice() else {
        return None;
    };
    let endpoint = |member: &Expression| match &member.kind {
        ExpressionKind::Literal => member.text.chars().next(),
        ExpressionKind::Escape(kind) => escape::char_value(kind),
        _ => None,
    };
    let (start, end) = (endpoint(start)?, endpoint(end)?);
    (start <= end).then(|| charset::range(start, end))
}

/// Codepoints of a character type; also used outside sets.
pub fn type_class(kind: &TypeKind, unicode: bool) -> Option<ClassUnicode> {
    let class = match kind {
        TypeKind::Digit | TypeKind::NonDigit if unicode => charset::unicode_digit()?,
        TypeKind::Digit | TypeKind::NonDigit => charset::ascii_digit(),
        TypeKind::Word | TypeKind::NonWord if unicode => charset::unicode_word()?,
        TypeKind::Word | TypeKind::NonWord => charset::ascii_word(),
        TypeKind::Space | TypeKind::NonSpace if unicode => charset::unicode_space()?,
        TypeKind::Space | TypeKind::NonSpace => charset::ascii_space(),
        TypeKind::Hex | TypeKind::NonHex => charset::hex_digit(),
        TypeKind::Linebreak | TypeKind::ExtendedGrapheme | TypeKind::Unknown(_) => return None,
    };
    let negated = matches!(
        kind,
        TypeKind::NonDigit | TypeKind::NonWord | TypeKind::NonSpace | TypeKind::NonHex
    );
    Some(negate_if(class, negated))
}

fn negate_if(class: ClassUnicode, negated: bool) -> ClassUnicode {
    if negated {
        charset::negated(class)
    } else {
        class
    }
}
