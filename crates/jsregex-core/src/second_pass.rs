//! Second pass: resolve the deferred markers left by the first pass.
//!
//! Runs two transformations in order on the converted root:
//!
//! 1. A top-level keep mark (`\K`) turns everything before it into a
//!    lookbehind, so only what follows is part of the match.
//! 2. Conditionals are expanded by enumerating every combination of
//!    participating / non-participating controlling groups. Each combination
//!    becomes one alternative: a deep copy of the whole pattern in which the
//!    controlling groups are forced to match (or forced to `{0}`) and every
//!    conditional is reduced to the branch that combination selects.
//!
//! With `k` distinct controlling groups the output holds `2^k` copies of the
//! pattern.

use crate::ast::{Quantifier, QuantifierMode};
use crate::node::{Child, Node, NodeKind};

/// Resolve all deferred markers. `group_count` is the number of capturing
/// groups in the first-pass output.
pub fn run(root: Node, group_count: usize) -> Node {
    let root = resolve_keep_mark(root);
    resolve_conditionals(root, group_count)
}

fn is_keep_mark(child: &Child) -> bool {
    matches!(child, Child::Node(node) if node.kind == NodeKind::KeepMark)
}

fn resolve_keep_mark(mut root: Node) -> Node {
    let Some(index) = root.children.iter().rposition(is_keep_mark) else {
        return root;
    };
    let following = root.children.split_off(index + 1);
    root.children.truncate(index);

    // only the last mark counts
    let mut preceding = vec![Child::from("(?<=")];
    preceding.extend(root.children.drain(..).map(|child| {
        if is_keep_mark(&child) {
            Child::Node(Node::dropped())
        } else {
            child
        }
    }));
    preceding.push(Child::from(")"));

    root.children.push(Child::Node(Node::plain(preceding)));
    root.children.extend(following);
    root
}

fn resolve_conditionals(root: Node, group_count: usize) -> Node {
    let mut references: Vec<usize> = Vec::new();
    root.walk(&mut |node| {
        if node.kind == NodeKind::Conditional {
            if let Some(reference) = node.reference {
                if !references.contains(&reference) {
                    references.push(reference);
                }
            }
        }
    });
    if references.is_empty() {
        return root;
    }

    let assignments = truth_assignments(references.len());
    tracing::debug!(
        groups = references.len(),
        alternatives = assignments.len(),
        "expanding conditionals"
    );

    let mut children = Vec::with_capacity(assignments.len() * 4);
    for (index, truths) in assignments.iter().enumerate() {
        let mut branch = root.clone();
        let offset = group_count * index;
        branch.walk_mut(&mut |node| rewrite(node, &references, truths, offset));

        if index > 0 {
            children.push(Child::from("|"));
        }
        children.push(Child::from("(?:"));
        children.push(Child::Node(branch));
        children.push(Child::from(")"));
    }
    Node::plain(children)
}

/// Every true/false assignment over `k` groups, by number of true groups,
/// then in combination order.
fn truth_assignments(k: usize) -> Vec<Vec<bool>> {
    let mut assignments = Vec::with_capacity(1usize.checked_shl(k as u32).unwrap_or(0));
    for size in 0..=k {
        let mut chosen = Vec::with_capacity(size);
        combinations(k, size, 0, &mut chosen, &mut assignments);
    }
    assignments
}

fn combinations(
    k: usize,
    size: usize,
    start: usize,
    chosen: &mut Vec<usize>,
    out: &mut Vec<Vec<bool>>,
) {
    if chosen.len() == size {
        let mut truths = vec![false; k];
        for &index in chosen.iter() {
            truths[index] = true;
        }
        out.push(truths);
        return;
    }
    for index in start..k {
        chosen.push(index);
        combinations(k, size, index + 1, chosen, out);
        chosen.pop();
    }
}

fn rewrite(node: &mut Node, references: &[usize], truths: &[bool], offset: usize) {
    let truth = |reference: Option<usize>| {
        let reference = reference?;
        references
            .iter()
            .position(|&r| r == reference)
            .map(|index| truths[index])
    };

    match node.kind {
        NodeKind::CapturedGroup => {
            // names would repeat across alternatives
            node.name = None;
            match truth(node.reference) {
                Some(true) => require_match(node),
                Some(false) => null_quantify(node),
                None => {}
            }
        }
        NodeKind::Backref => {
            node.name = None;
            node.reference = node.reference.map(|number| number + offset);
        }
        NodeKind::Conditional => {
            let matched = truth(node.reference).unwrap_or(false);
            {
                let mut branches: Vec<&mut Node> = node.child_nodes_mut().collect();
                match branches.as_mut_slice() {
                    [only] if !matched => null_quantify(only),
                    [yes, no] => null_quantify(if matched { no } else { yes }),
                    _ => {}
                }
            }
            node.kind = NodeKind::Plain;
        }
        NodeKind::Plain | NodeKind::KeepMark | NodeKind::Dropped => {}
    }
}

fn null_quantify(node: &mut Node) {
    node.quantifier = Some(Quantifier::new(0, Some(0), QuantifierMode::Greedy));
}

/// Make a quantified group match at least once without changing how often
/// it may repeat.
fn require_match(node: &mut Node) {
    let Some(quantifier) = &node.quantifier else {
        return;
    };
    if quantifier.min > 0 {
        return;
    }
    if quantifier.max == Some(1) {
        node.quantifier = None;
        return;
    }
    let mode = match quantifier.mode {
        QuantifierMode::Reluctant => QuantifierMode::Reluctant,
        _ => QuantifierMode::Greedy,
    };
    node.quantifier = Some(Quantifier::new(1, quantifier.max, mode));
}
