//! Warnings emitted when a construct has no faithful equivalent in the target dialect.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::Span;

/// A recoverable incompatibility found during conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Classification of the warning.
    pub kind: WarningKind,
    /// Source range of the offending construct, when known.
    pub span: Option<Span>,
    /// Human-readable description naming the construct and its position.
    pub message: String,
}

/// Classification of conversion warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The construct contributed no output.
    Dropped,
    /// The construct was replaced with a looser approximation.
    Degraded,
    /// A recursive expansion was cut off.
    Curtailed,
}

impl Warning {
    pub fn new(kind: WarningKind, span: Option<Span>, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
