//! Mutable traversal state shared by all conversion rules.
//!
//! One `Context` exists per top-level conversion call. It tracks capturing
//! group numbering (including groups injected by emulations), the atomic
//! group guard, per-call-site recursion counts, accumulated warnings and the
//! output flags that rules require.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::ast::{Expression, Family, Pattern, Span};
use crate::config::{ConvertOptions, Target};
use crate::converters::{Converter, Registry};
use crate::error::ConvertError;
use crate::warning::{Warning, WarningKind};

pub struct Context<'a> {
    pattern: &'a Pattern,
    options: ConvertOptions,
    registry: Registry,
    /// Total capturing groups emitted so far, original or synthetic.
    capturing_group_count: usize,
    /// Original group count at the time of injection → groups injected there.
    added_capturing_groups_after_group: BTreeMap<usize, usize>,
    case_insensitive_root: bool,
    in_atomic_group: bool,
    /// Active subexpression-call expansions.
    call_depth: usize,
    /// Expansions performed so far, by call-site source offset.
    recursions: HashMap<Span, usize>,
    /// Nesting level of the expression being converted; the root's children are at 1.
    depth: usize,
    warnings: Vec<Warning>,
    required_flags: BTreeSet<char>,
}

impl<'a> Context<'a> {
    pub fn new(pattern: &'a Pattern, options: &ConvertOptions) -> Self {
        Self {
            pattern,
            options: options.clone(),
            registry: Registry::for_target(options.target),
            capturing_group_count: 0,
            added_capturing_groups_after_group: BTreeMap::new(),
            case_insensitive_root: pattern.root().options.case_insensitive,
            in_atomic_group: false,
            call_depth: 0,
            recursions: HashMap::new(),
            depth: 0,
            warnings: Vec::new(),
            required_flags: BTreeSet::new(),
        }
    }

    pub fn pattern(&self) -> &'a Pattern {
        self.pattern
    }

    pub fn target(&self) -> Target {
        self.options.target
    }

    /// Conversion rule for `family` on this target.
    pub fn handler(&self, family: Family) -> Converter {
        self.registry.get(family)
    }

    pub fn case_insensitive_root(&self) -> bool {
        self.case_insensitive_root
    }

    pub fn capturing_group_count(&self) -> usize {
        self.capturing_group_count
    }

    /// Record one more capturing group in the output.
    pub fn capture_group(&mut self) {
        self.capturing_group_count += 1;
    }

    /// Record a synthetic capturing group injected at the current position.
    ///
    /// Every numeric backreference to a later original group shifts by one.
    pub fn increment_local_capturing_group_count(&mut self) {
        let original = self.original_capturing_group_count();
        *self
            .added_capturing_groups_after_group
            .entry(original)
            .or_insert(0) += 1;
        self.capture_group();
    }

    /// Undo the latest [`increment_local_capturing_group_count`]. No group
    /// may have been recorded since.
    ///
    /// [`increment_local_capturing_group_count`]: Self::increment_local_capturing_group_count
    pub fn release_local_capturing_group(&mut self) {
        let original = self.original_capturing_group_count();
        if let Some(added) = self.added_capturing_groups_after_group.get_mut(&original) {
            *added -= 1;
            if *added == 0 {
                self.added_capturing_groups_after_group.remove(&original);
            }
            self.capturing_group_count -= 1;
        }
    }

    /// Record a capturing group that mirrors an input group. Inside an
    /// inlined subexpression call the group is a copy, so it counts as
    /// synthetic.
    pub fn capture_original_group(&mut self) {
        if self.call_depth > 0 {
            self.increment_local_capturing_group_count();
        } else {
            self.capture_group();
        }
    }

    /// Map a 1-based source group number to its number in the output.
    pub fn new_capturing_group_position(&self, old_position: usize) -> usize {
        let increment: usize = self
            .added_capturing_groups_after_group
            .range(..old_position)
            .map(|(_, count)| count)
            .sum();
        old_position + increment
    }

    fn original_capturing_group_count(&self) -> usize {
        let added: usize = self.added_capturing_groups_after_group.values().sum();
        self.capturing_group_count - added
    }

    pub fn in_atomic_group(&self) -> bool {
        self.in_atomic_group
    }

    pub fn start_atomic_group(&mut self) {
        self.in_atomic_group = true;
    }

    pub fn end_atomic_group(&mut self) {
        self.in_atomic_group = false;
    }

    /// Expansions already performed for the call site of `expression`.
    pub fn recursions(&self, expression: &Expression) -> usize {
        self.recursions.get(&expression.span).copied().unwrap_or(0)
    }

    pub fn count_recursion(&mut self, expression: &Expression) {
        *self.recursions.entry(expression.span).or_insert(0) += 1;
    }

    pub fn recursion_limit(&self) -> usize {
        self.options.recursion_limit
    }

    pub fn start_subexp_call(&mut self) {
        self.call_depth += 1;
    }

    pub fn end_subexp_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn descend(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Append a warning, or abort the conversion in strict mode.
    pub fn warn(
        &mut self,
        kind: WarningKind,
        span: Option<Span>,
        message: impl Into<String>,
    ) -> Result<(), ConvertError> {
        let warning = Warning::new(kind, span, message);
        tracing::debug!(kind = ?warning.kind, message = %warning.message, "conversion warning");
        if self.options.strict {
            return Err(ConvertError::Incompatible { warning });
        }
        self.warnings.push(warning);
        Ok(())
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    /// Require an output flag, e.g. `u` for extended-codepoint mode.
    pub fn require_flag(&mut self, flag: char) {
        self.required_flags.insert(flag);
    }

    /// Whether extended-codepoint mode has been switched on.
    pub fn unicode_mode(&self) -> bool {
        self.required_flags.contains(&'u')
    }

    /// Switch on extended-codepoint mode if the target has it.
    pub fn enable_unicode_mode(&mut self) -> bool {
        if self.target().supports_unicode_mode() {
            self.require_flag('u');
            true
        } else {
            false
        }
    }

    /// Deduplicated, sorted output flags.
    pub fn flags(&self) -> String {
        let mut flags = self.required_flags.clone();
        if self.case_insensitive_root {
            flags.insert('i');
        }
        flags.into_iter().collect()
    }
}
