//! Output tree produced by conversion.
//!
//! A node owns an ordered list of children, each raw text or a nested node,
//! plus an optional quantifier and a type tag. `Conditional` and `KeepMark`
//! nodes are deferred markers that the second pass must eliminate before the
//! tree is rendered.

use crate::ast::Quantifier;
use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Plain,
    /// A capturing group; `reference` is the source group number.
    CapturedGroup,
    /// A numeric or named backreference; `reference` is the output group number.
    Backref,
    /// Deferred conditional; `reference` is the controlling source group.
    Conditional,
    /// Deferred `\K` marker.
    KeepMark,
    /// Renders as nothing but keeps its place in the tree.
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Text(String),
    Node(Node),
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub children: Vec<Child>,
    pub quantifier: Option<Quantifier>,
    pub kind: NodeKind,
    pub reference: Option<usize>,
    /// Group or backreference name, rendered as `(?<name>` / `\k<name>`.
    pub name: Option<String>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            quantifier: None,
            kind: NodeKind::Plain,
            reference: None,
            name: None,
        }
    }
}

impl Node {
    pub fn plain(children: Vec<Child>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::plain(vec![Child::Text(text.into())])
    }

    pub fn dropped() -> Self {
        Self {
            kind: NodeKind::Dropped,
            ..Self::default()
        }
    }

    pub fn keep_mark() -> Self {
        Self {
            kind: NodeKind::KeepMark,
            ..Self::default()
        }
    }

    /// A capturing group around `content`.
    pub fn captured_group(content: Vec<Child>, reference: usize, name: Option<String>) -> Self {
        Self {
            children: content,
            kind: NodeKind::CapturedGroup,
            reference: Some(reference),
            name,
            ..Self::default()
        }
    }

    /// A backreference to output group `number`, by name when one is given.
    pub fn backref(number: usize, name: Option<String>) -> Self {
        Self {
            kind: NodeKind::Backref,
            reference: Some(number),
            name,
            ..Self::default()
        }
    }

    /// A deferred conditional controlled by source group `reference`.
    /// Each branch is wrapped in its own passive group.
    pub fn conditional(reference: usize, branches: Vec<Node>) -> Self {
        let mut children = vec![Child::from("(?:")];
        children.extend(branches.into_iter().map(|branch| {
            Child::Node(Node::plain(vec![
                Child::from("(?:"),
                Child::Node(branch),
                Child::from(")"),
            ]))
        }));
        children.push(Child::from(")"));
        Self {
            children,
            kind: NodeKind::Conditional,
            reference: Some(reference),
            ..Self::default()
        }
    }

    pub fn with_quantifier(mut self, quantifier: Option<Quantifier>) -> Self {
        self.quantifier = quantifier;
        self
    }

    pub fn push(&mut self, child: impl Into<Child>) {
        self.children.push(child.into());
    }

    pub fn is_dropped(&self) -> bool {
        self.kind == NodeKind::Dropped
    }

    /// Nested nodes among the children, in order.
    pub fn child_nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|child| match child {
            Child::Node(node) => Some(node),
            Child::Text(_) => None,
        })
    }

    pub fn child_nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.children.iter_mut().filter_map(|child| match child {
            Child::Node(node) => Some(node),
            Child::Text(_) => None,
        })
    }

    /// Visit this node and all descendants depth-first, parents before children.
    pub fn walk(&self, visit: &mut impl FnMut(&Node)) {
        visit(self);
        for child in self.child_nodes() {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Node)) {
        visit(self);
        for child in self.child_nodes_mut() {
            child.walk_mut(visit);
        }
    }

    /// Whether every child is a dropped node (and there is at least one).
    pub fn is_entirely_dropped(&self) -> bool {
        !self.children.is_empty()
            && self.children.iter().all(|child| match child {
                Child::Node(node) => node.is_dropped() || node.is_entirely_dropped(),
                Child::Text(text) => text.is_empty(),
            })
    }

    /// Serialize the tree to pattern text.
    pub fn render(&self) -> Result<String, RenderError> {
        let mut out = String::new();
        self.render_into(&mut out)?;
        Ok(out)
    }

    fn render_into(&self, out: &mut String) -> Result<(), RenderError> {
        match self.kind {
            NodeKind::Dropped => return Ok(()),
            NodeKind::Conditional | NodeKind::KeepMark => {
                return Err(RenderError { kind: self.kind })
            }
            NodeKind::Backref => match (&self.name, self.reference) {
                (Some(name), _) => {
                    out.push_str("\\k<");
                    out.push_str(name);
                    out.push('>');
                }
                (None, Some(number)) => {
                    out.push('\\');
                    out.push_str(&number.to_string());
                }
                (None, None) => {}
            },
            NodeKind::CapturedGroup => {
                match &self.name {
                    Some(name) => {
                        out.push_str("(?<");
                        out.push_str(name);
                        out.push('>');
                    }
                    None => out.push('('),
                }
                self.render_children(out)?;
                out.push(')');
            }
            NodeKind::Plain => self.render_children(out)?,
        }
        if let Some(quantifier) = &self.quantifier {
            out.push_str(&quantifier.text);
        }
        Ok(())
    }

    fn render_children(&self, out: &mut String) -> Result<(), RenderError> {
        for child in &self.children {
            match child {
                Child::Text(text) => out.push_str(text),
                Child::Node(node) => node.render_into(out)?,
            }
        }
        Ok(())
    }
}
