//! Test-only parser for the subset of Onigmo syntax the integration tests
//! use. It stands in for the external parser that produces input trees in
//! production, and panics on anything it does not understand.

#![allow(dead_code)]

use std::collections::HashMap;

use jsregex_core::ast::{
    AnchorKind, BackrefKind, EscapeKind, Expression, ExpressionKind, FreeSpaceKind, GroupKind,
    LookaroundKind, MetaKind, Options, Pattern, Quantifier, QuantifierMode, Reference, SetKind,
    Span, TypeKind,
};
use jsregex_core::{convert, Conversion, ConvertError, ConvertOptions, Target};

/// Parse `source` with the given global flags (`i`, `m`, `x`, `u`).
pub fn parse_with_flags(source: &str, flags: &str) -> Pattern {
    let options = options_from(flags, Options::default());
    let mut parser = Parser {
        src: source,
        pos: 0,
        group_count: 0,
        names: HashMap::new(),
    };
    let children = parser.alternation(options);
    assert_eq!(parser.pos, source.len(), "unparsed input in {source:?}");

    let mut root = Expression::new(ExpressionKind::Root, source, Span::new(0, source.len()))
        .with_children(children)
        .with_options(options);
    resolve_names(&mut root, &parser.names);
    Pattern::new(root)
}

pub fn parse(source: &str) -> Pattern {
    parse_with_flags(source, "")
}

pub fn convert_to(source: &str, target: Target) -> Result<Conversion, ConvertError> {
    let options = ConvertOptions {
        target,
        ..ConvertOptions::default()
    };
    convert(&parse(source), &options)
}

/// Convert for the default target and return the pattern text.
pub fn converted(source: &str) -> String {
    convert_to(source, Target::Es2018)
        .unwrap_or_else(|e| panic!("conversion of {source:?} failed: {e}"))
        .source
}

fn options_from(flags: &str, mut options: Options) -> Options {
    let mut enable = true;
    for flag in flags.chars() {
        match flag {
            '-' => enable = false,
            'i' => options.case_insensitive = enable,
            'm' => options.multiline = enable,
            'x' => options.extended = enable,
            'u' => options.unicode_classes = enable,
            other => panic!("unknown flag {other:?}"),
        }
    }
    options
}

fn resolve_names(expression: &mut Expression, names: &HashMap<String, usize>) {
    if let Some(reference) = &mut expression.reference {
        if let (Some(name), 0) = (&reference.name, reference.number) {
            reference.number = *names
                .get(name)
                .unwrap_or_else(|| panic!("undefined group name {name:?}"));
        }
    }
    for child in &mut expression.children {
        resolve_names(child, names);
    }
}

struct Parser<'s> {
    src: &'s str,
    pos: usize,
    group_count: usize,
    names: HashMap<String, usize>,
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(offset)
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn bump(&mut self) -> char {
        let c = self.peek().expect("unexpected end of pattern");
        self.pos += c.len_utf8();
        c
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, prefix: &str) {
        assert!(
            self.eat(prefix),
            "expected {prefix:?} at {} in {:?}",
            self.pos,
            self.src
        );
    }

    fn until(&mut self, end: char) -> &'s str {
        let start = self.pos;
        while self.peek() != Some(end) {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        self.bump();
        text
    }

    fn node(&self, kind: ExpressionKind, start: usize) -> Expression {
        Expression::new(kind, &self.src[start..self.pos], Span::new(start, self.pos))
    }

    /// Branches up to `)` or the end; a single branch is returned flat.
    fn alternation(&mut self, options: Options) -> Vec<Expression> {
        let start = self.pos;
        let (first, mut options) = self.branch(options);
        if self.peek() != Some('|') {
            return first;
        }
        let mut branches = vec![first];
        let mut branch_starts = vec![start];
        while self.eat("|") {
            branch_starts.push(self.pos);
            let (branch, next) = self.branch(options);
            options = next;
            branches.push(branch);
        }

        let mut sequences = Vec::with_capacity(branches.len());
        for (index, children) in branches.into_iter().enumerate() {
            let begin = branch_starts[index];
            let end = branch_starts
                .get(index + 1)
                .map(|next| next - 1)
                .unwrap_or(self.pos);
            sequences.push(
                Expression::new(
                    ExpressionKind::Sequence,
                    &self.src[begin..end],
                    Span::new(begin, end),
                )
                .with_children(children),
            );
        }
        vec![self
            .node(ExpressionKind::Meta(MetaKind::Alternation), start)
            .with_children(sequences)]
    }

    fn branch(&mut self, mut options: Options) -> (Vec<Expression>, Options) {
        let mut items: Vec<Expression> = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            if options.extended && (c.is_whitespace() || c == '#') {
                items.push(self.free_space());
                continue;
            }
            let mut atom = self.atom(&mut options);
            if let Some(quantifier) = self.quantifier() {
                atom.quantifier = Some(quantifier);
            }
            match items.last_mut() {
                Some(last)
                    if mergeable(last) && mergeable(&atom) && last.options == atom.options =>
                {
                    last.text.push_str(&atom.text);
                    last.span.end = atom.span.end;
                }
                _ => items.push(atom),
            }
        }
        (items, options)
    }

    fn free_space(&mut self) -> Expression {
        let start = self.pos;
        if self.eat("#") {
            while !matches!(self.peek(), None | Some('\n')) {
                self.bump();
            }
            return self.node(ExpressionKind::FreeSpace(FreeSpaceKind::Comment), start);
        }
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.node(ExpressionKind::FreeSpace(FreeSpaceKind::Whitespace), start)
    }

    fn atom(&mut self, options: &mut Options) -> Expression {
        let start = self.pos;
        let expression = match self.bump() {
            '(' => return self.group(start, options),
            '[' => return self.set(start, *options),
            '.' => self.node(ExpressionKind::Meta(MetaKind::Dot), start),
            '^' => self.node(ExpressionKind::Anchor(AnchorKind::BeginningOfLine), start),
            '$' => self.node(ExpressionKind::Anchor(AnchorKind::EndOfLine), start),
            '\\' => self.escape(start),
            _ => self.node(ExpressionKind::Literal, start),
        };
        expression.with_options(*options)
    }

    fn group(&mut self, start: usize, options: &mut Options) -> Expression {
        if self.eat("?#") {
            self.until(')');
            return self.node(ExpressionKind::Group(GroupKind::Comment), start);
        }
        if self.eat("?(") {
            return self.conditional(start, *options);
        }

        let mut inner = *options;
        let kind = if self.eat("?:") {
            ExpressionKind::Group(GroupKind::Passive)
        } else if self.eat("?>") {
            ExpressionKind::Group(GroupKind::Atomic)
        } else if self.eat("?~") {
            ExpressionKind::Group(GroupKind::Absence)
        } else if self.eat("?=") {
            ExpressionKind::Lookaround(LookaroundKind::Lookahead)
        } else if self.eat("?!") {
            ExpressionKind::Lookaround(LookaroundKind::NegativeLookahead)
        } else if self.eat("?<=") {
            ExpressionKind::Lookaround(LookaroundKind::Lookbehind)
        } else if self.eat("?<!") {
            ExpressionKind::Lookaround(LookaroundKind::NegativeLookbehind)
        } else if self.eat("?<") {
            let name = self.until('>').to_string();
            self.group_count += 1;
            self.names.entry(name.clone()).or_insert(self.group_count);
            ExpressionKind::Group(GroupKind::Named {
                name,
                number: self.group_count,
            })
        } else if self.eat("?") {
            let flags_start = self.pos;
            while self.peek().is_some_and(|c| "imxu-".contains(c)) {
                self.bump();
            }
            let flags = &self.src[flags_start..self.pos];
            inner = options_from(flags, *options);
            if self.eat(")") {
                *options = inner;
                return self
                    .node(ExpressionKind::Group(GroupKind::OptionsSwitch), start)
                    .with_options(inner);
            }
            self.expect(":");
            ExpressionKind::Group(GroupKind::Options)
        } else {
            self.group_count += 1;
            ExpressionKind::Group(GroupKind::Capture {
                number: self.group_count,
            })
        };

        let children = self.alternation(inner);
        self.expect(")");
        self.node(kind, start)
            .with_children(children)
            .with_options(inner)
    }

    fn conditional(&mut self, start: usize, options: Options) -> Expression {
        let condition = self.until(')');
        let reference = match condition.strip_prefix('<').and_then(|c| c.strip_suffix('>')) {
            Some(name) => Reference::named(0, name),
            None => Reference::number(condition.parse().expect("conditional group number")),
        };

        let mut branches = Vec::new();
        loop {
            let branch_start = self.pos;
            let (children, _) = self.branch(options);
            branches.push(self.node(ExpressionKind::Sequence, branch_start).with_children(children));
            if !self.eat("|") {
                break;
            }
        }
        self.expect(")");
        self.node(ExpressionKind::Conditional, start)
            .with_children(branches)
            .with_reference(reference)
            .with_options(options)
    }

    fn escape(&mut self, start: usize) -> Expression {
        let c = self.bump();
        let kind = match c {
            'd' => ExpressionKind::Type(TypeKind::Digit),
            'D' => ExpressionKind::Type(TypeKind::NonDigit),
            'w' => ExpressionKind::Type(TypeKind::Word),
            'W' => ExpressionKind::Type(TypeKind::NonWord),
            's' => ExpressionKind::Type(TypeKind::Space),
            'S' => ExpressionKind::Type(TypeKind::NonSpace),
            'h' => ExpressionKind::Type(TypeKind::Hex),
            'H' => ExpressionKind::Type(TypeKind::NonHex),
            'R' => ExpressionKind::Type(TypeKind::Linebreak),
            'X' => ExpressionKind::Type(TypeKind::ExtendedGrapheme),
            'b' => ExpressionKind::Anchor(AnchorKind::WordBoundary),
            'B' => ExpressionKind::Anchor(AnchorKind::NonwordBoundary),
            'A' => ExpressionKind::Anchor(AnchorKind::BeginningOfString),
            'z' => ExpressionKind::Anchor(AnchorKind::EndOfString),
            'Z' => ExpressionKind::Anchor(AnchorKind::EndOfStringOrBeforeEndOfLine),
            'G' => ExpressionKind::Anchor(AnchorKind::MatchStart),
            'K' => ExpressionKind::Keep,
            '1'..='9' => {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
                let number = self.src[start + 1..self.pos].parse().expect("group number");
                return self
                    .node(ExpressionKind::Backref(BackrefKind::Number), start)
                    .with_reference(Reference::number(number));
            }
            'k' => return self.reference(start, false),
            'g' => return self.reference(start, true),
            'p' | 'P' => {
                self.expect("{");
                let name = self.until('}');
                let (name, caret) = match name.strip_prefix('^') {
                    Some(name) => (name, true),
                    None => (name, false),
                };
                ExpressionKind::Property {
                    name: name.to_string(),
                    negated: (c == 'P') != caret,
                }
            }
            other => ExpressionKind::Escape(self.char_escape(other)),
        };
        self.node(kind, start)
    }

    /// `\k<…>` backreferences and `\g<…>` calls.
    fn reference(&mut self, start: usize, call: bool) -> Expression {
        self.expect("<");
        let body = self.until('>');
        let level = body[1..].find(['+', '-']).map(|index| index + 1);
        let (target, kind) = match level {
            Some(index) if !call => (&body[..index], BackrefKind::RecursionLevel),
            _ if call => (body, BackrefKind::Call),
            _ if body.starts_with('-') => (body, BackrefKind::NumberRelative),
            _ if body.parse::<usize>().is_ok() => (body, BackrefKind::Number),
            _ => (body, BackrefKind::Name),
        };
        let reference = if let Some(back) = target.strip_prefix('-') {
            let back: usize = back.parse().expect("relative group number");
            Reference::number(self.group_count + 1 - back)
        } else if let Ok(number) = target.parse::<usize>() {
            Reference::number(number)
        } else {
            Reference::named(self.names.get(target).copied().unwrap_or(0), target)
        };
        self.node(ExpressionKind::Backref(kind), start)
            .with_reference(reference)
    }

    fn char_escape(&mut self, c: char) -> EscapeKind {
        match c {
            'n' => EscapeKind::Newline,
            't' => EscapeKind::Tab,
            'r' => EscapeKind::CarriageReturn,
            'f' => EscapeKind::FormFeed,
            'v' => EscapeKind::VerticalTab,
            'a' => EscapeKind::Bell,
            'e' => EscapeKind::Escape,
            'x' => {
                let digits = if self.eat("{") {
                    self.until('}')
                } else {
                    let start = self.pos;
                    self.bump();
                    self.bump();
                    &self.src[start..self.pos]
                };
                EscapeKind::Hex(hex_char(digits))
            }
            'u' => {
                if self.eat("{") {
                    let chars: Vec<char> = self.until('}').split(' ').map(hex_char).collect();
                    match chars.as_slice() {
                        [single] => EscapeKind::Codepoint(*single),
                        _ => EscapeKind::CodepointList(chars),
                    }
                } else {
                    let start = self.pos;
                    for _ in 0..4 {
                        self.bump();
                    }
                    EscapeKind::Codepoint(hex_char(&self.src[start..self.pos]))
                }
            }
            '0' => {
                let start = self.pos - 1;
                while self.peek().is_some_and(|c| ('0'..='7').contains(&c)) {
                    self.bump();
                }
                let value = u32::from_str_radix(&self.src[start..self.pos], 8).expect("octal");
                EscapeKind::Octal(char::from_u32(value).expect("octal codepoint"))
            }
            'c' => EscapeKind::Control(self.bump()),
            'M' => {
                self.expect("-");
                if self.eat("\\C-") {
                    self.bump();
                    EscapeKind::MetaControlSequence
                } else {
                    self.bump();
                    EscapeKind::MetaSequence
                }
            }
            c if c.is_ascii_punctuation() => EscapeKind::Syntax(c),
            c => EscapeKind::Literal(c),
        }
    }

    fn set(&mut self, start: usize, options: Options) -> Expression {
        let negated = self.eat("^");
        let mut operands: Vec<Expression> = Vec::new();
        let mut members: Vec<Expression> = Vec::new();
        let mut operand_start = self.pos;

        while !self.eat("]") {
            if self.rest().starts_with("&&") {
                operands.push(self.sequence(operand_start, std::mem::take(&mut members)));
                self.pos += 2;
                operand_start = self.pos;
                continue;
            }
            let member = self.set_member(options);
            if self.peek() == Some('-') && self.peek_at(1) != Some(']') && is_char_member(&member)
            {
                self.bump();
                let end = self.set_member(options);
                let range_start = member.span.start;
                members.push(
                    self.node(ExpressionKind::Set(SetKind::Range), range_start)
                        .with_children(vec![member, end])
                        .with_options(options),
                );
            } else {
                members.push(member);
            }
        }

        if !operands.is_empty() {
            let end = self.pos - 1;
            let last = Expression::new(
                ExpressionKind::Sequence,
                &self.src[operand_start..end],
                Span::new(operand_start, end),
            )
            .with_children(members);
            operands.push(last);
            let first = operands[0].span.start;
            members = vec![Expression::new(
                ExpressionKind::Set(SetKind::Intersection),
                &self.src[first..end],
                Span::new(first, end),
            )
            .with_children(operands)];
        }

        self.node(ExpressionKind::Set(SetKind::Character { negated }), start)
            .with_children(members)
            .with_options(options)
    }

    fn sequence(&self, start: usize, members: Vec<Expression>) -> Expression {
        self.node(ExpressionKind::Sequence, start)
            .with_children(members)
    }

    fn set_member(&mut self, options: Options) -> Expression {
        let start = self.pos;
        if self.eat("[:") {
            let name = self.until(':');
            self.expect("]");
            let (name, negated) = match name.strip_prefix('^') {
                Some(name) => (name, true),
                None => (name, false),
            };
            return self.node(
                ExpressionKind::PosixClass {
                    name: name.to_string(),
                    negated,
                },
                start,
            );
        }
        let member = match self.bump() {
            '[' => return self.set(start, options),
            '\\' => match self.peek() {
                Some('b') => {
                    self.bump();
                    self.node(ExpressionKind::Escape(EscapeKind::Backspace), start)
                }
                Some('d' | 'D' | 'w' | 'W' | 's' | 'S' | 'h' | 'H' | 'R' | 'X' | 'p' | 'P') => {
                    self.escape(start)
                }
                _ => {
                    let c = self.bump();
                    let kind = ExpressionKind::Escape(self.char_escape(c));
                    self.node(kind, start)
                }
            },
            _ => self.node(ExpressionKind::Literal, start),
        };
        member.with_options(options)
    }

    fn quantifier(&mut self) -> Option<Quantifier> {
        let start = self.pos;
        let (min, max) = match self.peek()? {
            '*' => (0, None),
            '+' => (1, None),
            '?' => (0, Some(1)),
            '{' => {
                let (min, max, len) = interval(self.rest())?;
                self.pos += len;
                while let Some((_, _, len)) = interval(self.rest()) {
                    self.pos += len;
                }
                let mode = if self.eat("?") {
                    QuantifierMode::Reluctant
                } else {
                    QuantifierMode::Greedy
                };
                return Some(Quantifier {
                    min,
                    max,
                    mode,
                    text: self.src[start..self.pos].to_string(),
                });
            }
            _ => return None,
        };
        self.bump();
        let mode = if self.eat("?") {
            QuantifierMode::Reluctant
        } else if self.eat("+") {
            QuantifierMode::Possessive
        } else {
            QuantifierMode::Greedy
        };
        Some(Quantifier {
            min,
            max,
            mode,
            text: self.src[start..self.pos].to_string(),
        })
    }
}

/// `{n}`, `{n,}`, `{n,m}` or `{,m}` at the start of `text`.
fn interval(text: &str) -> Option<(usize, Option<usize>, usize)> {
    let body = text.strip_prefix('{')?;
    let end = body.find('}')?;
    let inner = &body[..end];
    let (min, max) = match inner.split_once(',') {
        None => {
            let n = inner.parse().ok()?;
            (n, Some(n))
        }
        Some(("", max)) => (0, Some(max.parse().ok()?)),
        Some((min, "")) => (min.parse().ok()?, None),
        Some((min, max)) => (min.parse().ok()?, Some(max.parse().ok()?)),
    };
    Some((min, max, end + 2))
}

fn hex_char(digits: &str) -> char {
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or_else(|| panic!("bad hex escape {digits:?}"))
}

fn mergeable(expression: &Expression) -> bool {
    matches!(expression.kind, ExpressionKind::Literal) && expression.quantifier.is_none()
}

fn is_char_member(expression: &Expression) -> bool {
    matches!(
        expression.kind,
        ExpressionKind::Literal | ExpressionKind::Escape(_)
    )
}
