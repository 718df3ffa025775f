//! Translate parsed Onigmo-style regular expressions into ECMAScript (or a
//! reduced PCRE dialect).
//!
//! The input is a syntax tree produced by an external parser ([`Pattern`]).
//! [`convert`] walks it once with a per-kind rule set, resolves the
//! constructs that need a whole-tree view in a second pass, and renders the
//! result. Anything the target cannot express is approximated or dropped,
//! and each such loss is reported as a [`Warning`]. In strict mode the first
//! loss aborts the conversion instead.
//!
//! ```
//! use jsregex_core::ast::{Expression, ExpressionKind, Pattern, Span};
//! use jsregex_core::{convert, ConvertOptions};
//!
//! let root = Expression::new(ExpressionKind::Root, "a/b", Span::new(0, 3)).with_children(vec![
//!     Expression::new(ExpressionKind::Literal, "a/b", Span::new(0, 3)),
//! ]);
//! let conversion = convert(&Pattern::new(root), &ConvertOptions::default()).unwrap();
//! assert_eq!(conversion.to_js_literal(), "/a\\/b/");
//! ```

pub mod ast;
pub mod charset;
pub mod config;
pub mod context;
pub mod converters;
pub mod error;
pub mod node;
pub mod second_pass;
pub mod warning;

use serde::Serialize;

pub use ast::{Expression, ExpressionKind, Pattern, Span};
pub use config::{ConvertOptions, Target};
pub use context::Context;
pub use error::{ConvertError, ErrorCode, RenderError};
pub use warning::{Warning, WarningKind};

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    /// Pattern text, without delimiters.
    pub source: String,
    /// Sorted, deduplicated flags from `{i, u}`.
    pub flags: String,
    /// Every approximation or loss, in traversal order.
    pub warnings: Vec<Warning>,
    pub target: Target,
}

impl Conversion {
    /// `/source/flags`
    pub fn to_js_literal(&self) -> String {
        format!("/{}/{}", self.source, self.flags)
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.message.clone()).collect()
    }

    pub fn is_lossless(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Convert `pattern` for `options.target`.
///
/// # Errors
///
/// [`ConvertError::Incompatible`] in strict mode when any construct could
/// not be translated faithfully; [`ConvertError::UnresolvedMarker`] if a
/// deferred marker survived the second pass.
pub fn convert(pattern: &Pattern, options: &ConvertOptions) -> Result<Conversion, ConvertError> {
    tracing::debug!(
        dialect = %options.target,
        strict = options.strict,
        groups = pattern.group_count(),
        "converting pattern"
    );

    let mut ctx = Context::new(pattern, options);
    let tree = converters::convert_expression(pattern.root(), &mut ctx)?;
    let tree = second_pass::run(tree, ctx.capturing_group_count());
    let source = tree.render()?;
    let flags = ctx.flags();
    let warnings = ctx.into_warnings();

    tracing::debug!(
        warnings = warnings.len(),
        length = source.len(),
        "conversion complete"
    );
    Ok(Conversion {
        source,
        flags,
        warnings,
        target: options.target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{GroupKind, Quantifier, QuantifierMode, Reference};
    use pretty_assertions::assert_eq;

    fn expr(kind: ExpressionKind, text: &str, start: usize) -> Expression {
        Expression::new(kind, text, Span::new(start, start + text.len()))
    }

    #[test]
    fn test_conditional_is_resolved_end_to_end() {
        // -(<)?a(?(1)>)-
        let group = expr(ExpressionKind::Group(GroupKind::Capture { number: 1 }), "(<)", 1)
            .with_children(vec![expr(ExpressionKind::Literal, "<", 2)])
            .with_quantifier(Quantifier::new(0, Some(1), QuantifierMode::Greedy));
        let conditional = expr(ExpressionKind::Conditional, "(?(1)>)", 6)
            .with_reference(Reference::number(1))
            .with_children(vec![expr(ExpressionKind::Sequence, ">", 11)
                .with_children(vec![expr(ExpressionKind::Literal, ">", 11)])]);
        let root = expr(ExpressionKind::Root, "-(<)?a(?(1)>)-", 0).with_children(vec![
            expr(ExpressionKind::Literal, "-", 0),
            group,
            expr(ExpressionKind::Literal, "a", 5),
            conditional,
            expr(ExpressionKind::Literal, "-", 13),
        ]);

        let conversion = convert(&Pattern::new(root), &ConvertOptions::default()).unwrap();

        assert_eq!(
            conversion.source,
            "(?:-(<){0}a(?:(?:>){0})-)|(?:-(<)a(?:(?:>))-)"
        );
        assert!(conversion.is_lossless());
    }

    #[test]
    fn test_keep_is_resolved_end_to_end() {
        let root = expr(ExpressionKind::Root, "a\\Kb", 0).with_children(vec![
            expr(ExpressionKind::Literal, "a", 0),
            expr(ExpressionKind::Keep, "\\K", 1),
            expr(ExpressionKind::Literal, "b", 3),
        ]);
        let conversion = convert(&Pattern::new(root), &ConvertOptions::default()).unwrap();
        assert_eq!(conversion.to_js_literal(), "/(?<=a)b/");
    }

    #[test]
    fn test_strict_mode_fails_on_first_warning() {
        let root = expr(ExpressionKind::Root, "a\\G", 0).with_children(vec![
            expr(ExpressionKind::Literal, "a", 0),
            expr(
                ExpressionKind::Anchor(crate::ast::AnchorKind::MatchStart),
                "\\G",
                1,
            ),
        ]);
        let options = ConvertOptions {
            strict: true,
            ..ConvertOptions::default()
        };
        let err = convert(&Pattern::new(root), &options).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::Incompatible);
        assert_eq!(
            err.to_string(),
            "Dropped unsupported match_start anchor '\\G' at index 1..3"
        );
    }
}
