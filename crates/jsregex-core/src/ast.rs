//! Input tree contract.
//!
//! The tree is produced by an external parser for the source dialect and is
//! read-only here. Every node carries its kind and subtype, its source text
//! (quantifier excluded), its byte span, an optional quantifier, children,
//! the scoped options already folded in by the parser, and for
//! reference-bearing kinds the resolved number of the referenced group.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte range `start..end` (end exclusive) in the source pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Matching options in effect for a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// `i`: case-insensitive matching.
    pub case_insensitive: bool,
    /// `m`: `.` also matches a newline.
    pub multiline: bool,
    /// `x`: free-spacing mode.
    pub extended: bool,
    /// `u`: `\d`, `\s`, `\w` use Unicode definitions.
    pub unicode_classes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantifierMode {
    Greedy,
    Reluctant,
    Possessive,
}

/// A repetition applied to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantifier {
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
    pub mode: QuantifierMode,
    /// Source text, e.g. `+`, `{2,}?` or an interval chain such as `{2}{3}`.
    pub text: String,
}

impl Quantifier {
    /// Build a quantifier with its canonical source text.
    pub fn new(min: usize, max: Option<usize>, mode: QuantifierMode) -> Self {
        let base = match (min, max) {
            (0, None) => "*".to_string(),
            (1, None) => "+".to_string(),
            (0, Some(1)) => "?".to_string(),
            (min, None) => format!("{{{min},}}"),
            (min, Some(max)) if min == max => format!("{{{min}}}"),
            (min, Some(max)) => format!("{{{min},{max}}}"),
        };
        let suffix = match mode {
            QuantifierMode::Greedy => "",
            QuantifierMode::Reluctant => "?",
            QuantifierMode::Possessive => "+",
        };
        Self {
            min,
            max,
            mode,
            text: format!("{base}{suffix}"),
        }
    }

    pub fn is_possessive(&self) -> bool {
        self.mode == QuantifierMode::Possessive
    }
}

/// Resolved target of a reference-bearing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Absolute number of the referenced capturing group; `0` is the whole pattern.
    pub number: usize,
    /// Name used at the reference site, if it referred by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Reference {
    pub fn number(number: usize) -> Self {
        Self { number, name: None }
    }

    pub fn named(number: usize, name: impl Into<String>) -> Self {
        Self {
            number,
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    BeginningOfLine,
    EndOfLine,
    BeginningOfString,
    EndOfString,
    EndOfStringOrBeforeEndOfLine,
    WordBoundary,
    NonwordBoundary,
    MatchStart,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookaroundKind {
    Lookahead,
    NegativeLookahead,
    Lookbehind,
    NegativeLookbehind,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackrefKind {
    /// `\1`, `\k<1>`
    Number,
    /// `\k<-1>`
    NumberRelative,
    /// `\k<name>`
    Name,
    /// `\k<1+0>`, `\k<name-1>`
    RecursionLevel,
    /// `\g<1>`, `\g<name>`, `\g<-1>`, `\g<0>`
    Call,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeKind {
    /// An escaped syntax character such as `\.` or `\\`.
    Syntax(char),
    Tab,
    Newline,
    CarriageReturn,
    FormFeed,
    VerticalTab,
    /// `\b` inside a bracket expression.
    Backspace,
    Bell,
    Escape,
    Hex(char),
    Octal(char),
    Codepoint(char),
    CodepointList(Vec<char>),
    /// `\cX` or `\C-X`; carries `X`.
    Control(char),
    /// `\M-x`
    MetaSequence,
    /// `\M-\C-x`
    MetaControlSequence,
    /// An escaped character with no special meaning, such as `\y`.
    Literal(char),
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeSpaceKind {
    Whitespace,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Capture { number: usize },
    Named { name: String, number: usize },
    Passive,
    Atomic,
    /// `(?~X)`
    Absence,
    /// `(?i:X)`
    Options,
    /// `(?i)`: affects following siblings.
    OptionsSwitch,
    /// `(?#...)`
    Comment,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaKind {
    Dot,
    Alternation,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetKind {
    /// A bracket expression; children are its members.
    Character { negated: bool },
    /// `a-z`; children are the two endpoints.
    Range,
    /// `X&&Y`; children are `Sequence` operands.
    Intersection,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Digit,
    NonDigit,
    Hex,
    NonHex,
    Space,
    NonSpace,
    Word,
    NonWord,
    Linebreak,
    ExtendedGrapheme,
    Unknown(String),
}

/// Kind and subtype of an input node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionKind {
    Root,
    /// One alternative of an alternation, or an operand of a set intersection.
    Sequence,
    Anchor(AnchorKind),
    Lookaround(LookaroundKind),
    Backref(BackrefKind),
    /// Children are the one or two branches; `reference` is the controlling group.
    Conditional,
    Escape(EscapeKind),
    FreeSpace(FreeSpaceKind),
    Group(GroupKind),
    /// `\K`
    Keep,
    Literal,
    Meta(MetaKind),
    PosixClass { name: String, negated: bool },
    Property { name: String, negated: bool },
    Set(SetKind),
    Type(TypeKind),
    Unknown(String),
}

/// Coarse kind used to look up a conversion handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Root,
    Sequence,
    Anchor,
    Lookaround,
    Backref,
    Conditional,
    Escape,
    FreeSpace,
    Group,
    Keep,
    Literal,
    Meta,
    PosixClass,
    Property,
    Set,
    Type,
    Unknown,
}

impl Family {
    pub fn name(self) -> &'static str {
        match self {
            Family::Root => "expression",
            Family::Sequence => "sequence",
            Family::Anchor => "anchor",
            Family::Lookaround => "assertion",
            Family::Backref => "backref",
            Family::Conditional => "conditional",
            Family::Escape => "escape",
            Family::FreeSpace => "free_space",
            Family::Group => "group",
            Family::Keep => "keep",
            Family::Literal => "literal",
            Family::Meta => "meta",
            Family::PosixClass => "posixclass",
            Family::Property => "property",
            Family::Set => "set",
            Family::Type => "type",
            Family::Unknown => "expression",
        }
    }
}

impl ExpressionKind {
    pub fn family(&self) -> Family {
        match self {
            ExpressionKind::Root => Family::Root,
            ExpressionKind::Sequence => Family::Sequence,
            ExpressionKind::Anchor(_) => Family::Anchor,
            ExpressionKind::Lookaround(_) => Family::Lookaround,
            ExpressionKind::Backref(_) => Family::Backref,
            ExpressionKind::Conditional => Family::Conditional,
            ExpressionKind::Escape(_) => Family::Escape,
            ExpressionKind::FreeSpace(_) => Family::FreeSpace,
            ExpressionKind::Group(_) => Family::Group,
            ExpressionKind::Keep => Family::Keep,
            ExpressionKind::Literal => Family::Literal,
            ExpressionKind::Meta(_) => Family::Meta,
            ExpressionKind::PosixClass { .. } => Family::PosixClass,
            ExpressionKind::Property { .. } => Family::Property,
            ExpressionKind::Set(_) => Family::Set,
            ExpressionKind::Type(_) => Family::Type,
            ExpressionKind::Unknown(_) => Family::Unknown,
        }
    }

    /// Snake-case subtype name used in warnings.
    pub fn subtype_name(&self) -> String {
        let name = match self {
            ExpressionKind::Root => "root",
            ExpressionKind::Sequence => "sequence",
            ExpressionKind::Anchor(kind) => match kind {
                AnchorKind::BeginningOfLine => "beginning_of_line",
                AnchorKind::EndOfLine => "end_of_line",
                AnchorKind::BeginningOfString => "beginning_of_string",
                AnchorKind::EndOfString => "end_of_string",
                AnchorKind::EndOfStringOrBeforeEndOfLine => "end_of_string_or_before_end_of_line",
                AnchorKind::WordBoundary => "word_boundary",
                AnchorKind::NonwordBoundary => "nonword_boundary",
                AnchorKind::MatchStart => "match_start",
                AnchorKind::Unknown(name) => return name.clone(),
            },
            ExpressionKind::Lookaround(kind) => match kind {
                LookaroundKind::Lookahead => "lookahead",
                LookaroundKind::NegativeLookahead => "negative_lookahead",
                LookaroundKind::Lookbehind => "lookbehind",
                LookaroundKind::NegativeLookbehind => "negative_lookbehind",
                LookaroundKind::Unknown(name) => return name.clone(),
            },
            ExpressionKind::Backref(kind) => match kind {
                BackrefKind::Number => "number",
                BackrefKind::NumberRelative => "number_relative",
                BackrefKind::Name => "name",
                BackrefKind::RecursionLevel => "recursion_level",
                BackrefKind::Call => "call",
                BackrefKind::Unknown(name) => return name.clone(),
            },
            ExpressionKind::Conditional => "open",
            ExpressionKind::Escape(kind) => match kind {
                EscapeKind::Syntax(_) => "syntax",
                EscapeKind::Tab => "tab",
                EscapeKind::Newline => "newline",
                EscapeKind::CarriageReturn => "carriage",
                EscapeKind::FormFeed => "form_feed",
                EscapeKind::VerticalTab => "vertical_tab",
                EscapeKind::Backspace => "backspace",
                EscapeKind::Bell => "bell",
                EscapeKind::Escape => "escape",
                EscapeKind::Hex(_) => "hex",
                EscapeKind::Octal(_) => "octal",
                EscapeKind::Codepoint(_) => "codepoint",
                EscapeKind::CodepointList(_) => "codepoint_list",
                EscapeKind::Control(_) => "control",
                EscapeKind::MetaSequence => "meta_sequence",
                EscapeKind::MetaControlSequence => "meta_control_sequence",
                EscapeKind::Literal(_) => "literal",
                EscapeKind::Unknown(name) => return name.clone(),
            },
            ExpressionKind::FreeSpace(FreeSpaceKind::Whitespace) => "whitespace",
            ExpressionKind::FreeSpace(FreeSpaceKind::Comment) => "comment",
            ExpressionKind::Group(kind) => match kind {
                GroupKind::Capture { .. } => "capture",
                GroupKind::Named { .. } => "named",
                GroupKind::Passive => "passive",
                GroupKind::Atomic => "atomic",
                GroupKind::Absence => "absence",
                GroupKind::Options => "options",
                GroupKind::OptionsSwitch => "options_switch",
                GroupKind::Comment => "comment",
                GroupKind::Unknown(name) => return name.clone(),
            },
            ExpressionKind::Keep => "mark",
            ExpressionKind::Literal => "literal",
            ExpressionKind::Meta(kind) => match kind {
                MetaKind::Dot => "dot",
                MetaKind::Alternation => "alternation",
                MetaKind::Unknown(name) => return name.clone(),
            },
            ExpressionKind::PosixClass { name, .. } | ExpressionKind::Property { name, .. } => {
                return name.to_ascii_lowercase()
            }
            ExpressionKind::Set(kind) => match kind {
                SetKind::Character { .. } => "character",
                SetKind::Range => "range",
                SetKind::Intersection => "intersection",
                SetKind::Unknown(name) => return name.clone(),
            },
            ExpressionKind::Type(kind) => match kind {
                TypeKind::Digit => "digit",
                TypeKind::NonDigit => "nondigit",
                TypeKind::Hex => "hex",
                TypeKind::NonHex => "nonhex",
                TypeKind::Space => "space",
                TypeKind::NonSpace => "nonspace",
                TypeKind::Word => "word",
                TypeKind::NonWord => "nonword",
                TypeKind::Linebreak => "linebreak",
                TypeKind::ExtendedGrapheme => "xgrapheme",
                TypeKind::Unknown(name) => return name.clone(),
            },
            ExpressionKind::Unknown(name) => return name.clone(),
        };
        name.to_string()
    }
}

/// A node of the input tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    /// Source text of the construct, quantifier excluded.
    pub text: String,
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantifier: Option<Quantifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(default)]
    pub options: Options,
}

impl Expression {
    pub fn new(kind: ExpressionKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            quantifier: None,
            children: Vec::new(),
            reference: None,
            options: Options::default(),
        }
    }

    pub fn with_children(mut self, children: Vec<Expression>) -> Self {
        self.children = children;
        self
    }

    pub fn with_quantifier(mut self, quantifier: Quantifier) -> Self {
        self.quantifier = Some(quantifier);
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Deep copy without this node's own quantifier.
    pub fn unquantified_clone(&self) -> Self {
        let mut copy = self.clone();
        copy.quantifier = None;
        copy
    }

    /// Number of the capturing group this node opens, if any.
    pub fn capture_number(&self) -> Option<usize> {
        match &self.kind {
            ExpressionKind::Group(GroupKind::Capture { number })
            | ExpressionKind::Group(GroupKind::Named { number, .. }) => Some(*number),
            _ => None,
        }
    }

    /// Text plus quantifier, as it appeared in the source.
    pub fn full_text(&self) -> String {
        match &self.quantifier {
            Some(q) => format!("{}{}", self.text, q.text),
            None => self.text.clone(),
        }
    }

    /// Static match length in characters, or `None` when it cannot be known
    /// without matching (backreferences and calls).
    pub fn match_length(&self) -> Option<MatchLength> {
        let base = match &self.kind {
            ExpressionKind::Literal => MatchLength::fixed(self.text.chars().count()),
            ExpressionKind::Escape(EscapeKind::CodepointList(chars)) => {
                MatchLength::fixed(chars.len())
            }
            ExpressionKind::Escape(_)
            | ExpressionKind::Set(_)
            | ExpressionKind::Property { .. }
            | ExpressionKind::PosixClass { .. }
            | ExpressionKind::Meta(MetaKind::Dot) => MatchLength::fixed(1),
            ExpressionKind::Type(TypeKind::Linebreak) => MatchLength {
                min: 1,
                max: Some(2),
            },
            ExpressionKind::Type(TypeKind::ExtendedGrapheme) => MatchLength {
                min: 1,
                max: None,
            },
            ExpressionKind::Type(_) => MatchLength::fixed(1),
            ExpressionKind::Anchor(_)
            | ExpressionKind::Lookaround(_)
            | ExpressionKind::Keep
            | ExpressionKind::FreeSpace(_)
            | ExpressionKind::Group(GroupKind::OptionsSwitch)
            | ExpressionKind::Group(GroupKind::Comment) => MatchLength::fixed(0),
            ExpressionKind::Group(GroupKind::Absence) => MatchLength { min: 0, max: None },
            ExpressionKind::Meta(MetaKind::Alternation) | ExpressionKind::Conditional => {
                let mut branches = self
                    .children
                    .iter()
                    .map(Expression::match_length)
                    .collect::<Option<Vec<_>>>()?;
                if matches!(self.kind, ExpressionKind::Conditional) && branches.len() < 2 {
                    branches.push(MatchLength::fixed(0));
                }
                branches.into_iter().reduce(MatchLength::either)?
            }
            ExpressionKind::Root | ExpressionKind::Sequence | ExpressionKind::Group(_) => self
                .children
                .iter()
                .map(Expression::match_length)
                .try_fold(MatchLength::fixed(0), |acc, len| Some(acc.then(len?)))?,
            ExpressionKind::Backref(_) | ExpressionKind::Unknown(_) | ExpressionKind::Meta(_) => {
                return None
            }
        };
        Some(match &self.quantifier {
            Some(q) => base.repeat(q.min, q.max),
            None => base,
        })
    }
}

/// Minimum and maximum number of characters a node can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchLength {
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
}

impl MatchLength {
    pub fn fixed(len: usize) -> Self {
        Self {
            min: len,
            max: Some(len),
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.max == Some(self.min)
    }

    fn then(self, next: MatchLength) -> Self {
        Self {
            min: self.min.saturating_add(next.min),
            max: self
                .max
                .zip(next.max)
                .and_then(|(a, b)| a.checked_add(b)),
        }
    }

    fn either(self, other: MatchLength) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.zip(other.max).map(|(a, b)| a.max(b)),
        }
    }

    fn repeat(self, min: usize, max: Option<usize>) -> Self {
        let upper = match (self.max, max) {
            (Some(0), _) => Some(0),
            (_, Some(0)) => Some(0),
            (Some(a), Some(b)) => a.checked_mul(b),
            _ => None,
        };
        Self {
            min: self.min.saturating_mul(min),
            max: upper,
        }
    }
}

/// A parsed pattern: the root expression plus an index of its capturing
/// groups, so that reference-bearing nodes can be resolved to their targets.
#[derive(Debug, Clone)]
pub struct Pattern {
    root: Expression,
    /// Group number → child-index path from the root.
    groups: HashMap<usize, Vec<usize>>,
    names: HashMap<String, usize>,
}

impl Pattern {
    pub fn new(root: Expression) -> Self {
        let mut groups = HashMap::new();
        let mut names = HashMap::new();
        let mut path = Vec::new();
        index_groups(&root, &mut path, &mut groups, &mut names);
        Self {
            root,
            groups,
            names,
        }
    }

    pub fn root(&self) -> &Expression {
        &self.root
    }

    /// The expression a reference number points at; `0` is the whole pattern.
    pub fn group(&self, number: usize) -> Option<&Expression> {
        if number == 0 {
            return Some(&self.root);
        }
        let path = self.groups.get(&number)?;
        path.iter()
            .try_fold(&self.root, |node, &index| node.children.get(index))
    }

    pub fn group_number(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Number of capturing groups in the source pattern.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

fn index_groups(
    node: &Expression,
    path: &mut Vec<usize>,
    groups: &mut HashMap<usize, Vec<usize>>,
    names: &mut HashMap<String, usize>,
) {
    if let Some(number) = node.capture_number() {
        groups.entry(number).or_insert_with(|| path.clone());
        if let ExpressionKind::Group(GroupKind::Named { name, .. }) = &node.kind {
            names.entry(name.clone()).or_insert(number);
        }
    }
    for (index, child) in node.children.iter().enumerate() {
        path.push(index);
        index_groups(child, path, groups, names);
        path.pop();
    }
}
