//! Error types for pattern conversion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::Span;
use crate::node::NodeKind;
use crate::warning::Warning;

/// Stable, machine-readable error codes.
///
/// Variant names and their serialized `snake_case` strings are part of the
/// public contract and must not change across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// The input pattern could not be parsed.
    ParseError,
    /// Strict mode refused a construct the target cannot express.
    Incompatible,
    /// The requested target dialect does not exist.
    UnknownTarget,
    /// The converter produced an invalid output tree (a bug, not bad input).
    InternalError,
}

/// Raised when an output tree still holds a deferred marker at render time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("node of type {kind:?} must be resolved before rendering")]
pub struct RenderError {
    pub kind: NodeKind,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Parse error at offset {offset}: {message}")]
    Parse { message: String, offset: usize },

    #[error("{warning}")]
    Incompatible { warning: Warning },

    #[error("Unknown target dialect: {0}")]
    UnknownTarget(String),

    #[error("Internal conversion error: {0}")]
    UnresolvedMarker(#[from] RenderError),
}

impl ConvertError {
    /// Wrap a failure reported by the parser that produced the input tree.
    pub fn parse(message: impl Into<String>, offset: usize) -> Self {
        ConvertError::Parse {
            message: message.into(),
            offset,
        }
    }

    /// Returns the stable error code for this error variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ConvertError::Parse { .. } => ErrorCode::ParseError,
            ConvertError::Incompatible { .. } => ErrorCode::Incompatible,
            ConvertError::UnknownTarget(_) => ErrorCode::UnknownTarget,
            ConvertError::UnresolvedMarker(_) => ErrorCode::InternalError,
        }
    }

    /// Returns the source range the error points at, if available.
    pub fn span(&self) -> Option<Span> {
        match self {
            ConvertError::Parse { offset, .. } => Some(Span::new(*offset, *offset)),
            ConvertError::Incompatible { warning } => warning.span,
            ConvertError::UnknownTarget(_) => None,
            ConvertError::UnresolvedMarker(_) => None,
        }
    }

    /// Produces a structured JSON error.
    ///
    /// Format: `{"code": "...", "message": "...", "span": {"start", "end"} | null}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "span": self.span(),
        })
    }
}
