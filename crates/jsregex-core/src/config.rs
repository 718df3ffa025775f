//! Configuration for pattern conversion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// Target dialect tier for pattern conversion.
///
/// Variants are declared in capability order, so `Ord` comparisons answer
/// "is this tier at least as capable as that one" for the ECMAScript tiers.
/// `PcreLite` sorts first: it is the reduced tier and registers only a
/// small handler set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    /// Reduced PCRE-style tier: literals, sets, simple groups and anchors only.
    PcreLite,
    /// ECMAScript 5: no `u` flag, no lookbehind, no named groups.
    Es2009,
    /// ECMAScript 2015: adds the `u` flag.
    Es2015,
    /// ECMAScript 2018: adds lookbehind, named groups and property escapes.
    Es2018,
    /// ECMAScript 2020.
    Es2020,
    /// ECMAScript 2024.
    Es2024,
}

impl Target {
    pub const ALL: [Target; 6] = [
        Target::PcreLite,
        Target::Es2009,
        Target::Es2015,
        Target::Es2018,
        Target::Es2020,
        Target::Es2024,
    ];

    /// Whether the dialect is one of the ECMAScript tiers.
    pub fn is_ecmascript(self) -> bool {
        self >= Target::Es2009
    }

    /// Whether the `u` flag (extended-codepoint mode) exists.
    pub fn supports_unicode_mode(self) -> bool {
        self >= Target::Es2015
    }

    pub fn supports_lookbehind(self) -> bool {
        self >= Target::Es2018
    }

    pub fn supports_named_groups(self) -> bool {
        self >= Target::Es2018
    }

    /// Whether `\p{..}` / `\P{..}` escapes exist (they require the `u` flag).
    pub fn supports_property_escapes(self) -> bool {
        self >= Target::Es2018
    }

    /// Whether strings are UTF-16, so astral characters need surrogate pairs
    /// unless extended-codepoint mode is on.
    pub fn is_utf16(self) -> bool {
        self.is_ecmascript()
    }

    pub fn name(self) -> &'static str {
        match self {
            Target::PcreLite => "pcre-lite",
            Target::Es2009 => "es2009",
            Target::Es2015 => "es2015",
            Target::Es2018 => "es2018",
            Target::Es2020 => "es2020",
            Target::Es2024 => "es2024",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "pcre-lite" | "pcre" => Ok(Target::PcreLite),
            "es2009" | "es5" => Ok(Target::Es2009),
            "es2015" | "es6" => Ok(Target::Es2015),
            "es2018" => Ok(Target::Es2018),
            "es2020" => Ok(Target::Es2020),
            "es2024" => Ok(Target::Es2024),
            _ => Err(ConvertError::UnknownTarget(s.to_string())),
        }
    }
}

/// Options for pattern conversion.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `recursion-limit`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConvertOptions {
    /// Target dialect. Default: ES2018.
    pub target: Target,
    /// Abort on the first warning instead of collecting it.
    pub strict: bool,
    /// Maximum number of times a single subexpression call site is inlined
    /// before the expansion is curtailed. Default: 5.
    pub recursion_limit: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            target: Target::Es2018,
            strict: false,
            recursion_limit: 5,
        }
    }
}
