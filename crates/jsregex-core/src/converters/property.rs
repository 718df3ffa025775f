//! Unicode properties (`\p{Greek}`) and POSIX classes outside brackets.

use super::{atom_node, set, unsupported};
use crate::ast::{Expression, ExpressionKind};
use crate::charset;
use crate::context::Context;
use crate::error::ConvertError;
use crate::node::Node;

pub fn convert(expression: &Expression, ctx: &mut Context<'_>) -> Result<Node, ConvertError> {
    let (name, negated, posix) = match &expression.kind {
        ExpressionKind::Property { name, negated } => (name, *negated, false),
        ExpressionKind::PosixClass { name, negated } => (name, *negated, true),
        _ => return unsupported(expression, ctx),
    };

    if !posix && ctx.target().supports_property_escapes() {
        if let Some(native) = native_name(name) {
            if ctx.enable_unicode_mode() {
                let p = if negated { 'P' } else { 'p' };
                return Ok(Node::text(format!("\\{p}{{{native}}}")));
            }
        }
    }

    let class = if posix {
        charset::posix_class(name)
    } else {
        charset::posix_class(name).or_else(|| charset::property(name))
    };
    let Some(mut class) = class else {
        return unsupported(expression, ctx);
    };
    if negated {
        class = charset::negated(class);
    }
    Ok(atom_node(set::serialize(&class, ctx), expression))
}

/// The target's spelling of a source property name, if it has one.
fn native_name(name: &str) -> Option<String> {
    let key: String = name
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if let Some(category) = GENERAL_CATEGORIES
        .iter()
        .find(|(short, long)| short.eq_ignore_ascii_case(&key) || *long == key)
    {
        return Some(category.0.to_string());
    }
    if let Some(binary) = BINARY_PROPERTIES
        .iter()
        .find(|p| p.replace('_', "").eq_ignore_ascii_case(&key))
    {
        return Some(binary.to_string());
    }
    SCRIPTS
        .iter()
        .find(|s| s.replace('_', "").eq_ignore_ascii_case(&key))
        .map(|script| format!("Script={script}"))
}

const GENERAL_CATEGORIES: &[(&str, &str)] = &[
    ("L", "letter"),
    ("Lu", "uppercaseletter"),
    ("Ll", "lowercaseletter"),
    ("Lt", "titlecaseletter"),
    ("Lm", "modifierletter"),
    ("Lo", "otherletter"),
    ("M", "mark"),
    ("Mn", "nonspacingmark"),
    ("Mc", "spacingmark"),
    ("Me", "enclosingmark"),
    ("N", "number"),
    ("Nd", "decimalnumber"),
    ("Nl", "letternumber"),
    ("No", "othernumber"),
    ("P", "punctuation"),
    ("Pc", "connectorpunctuation"),
    ("Pd", "dashpunctuation"),
    ("Ps", "openpunctuation"),
    ("Pe", "closepunctuation"),
    ("Pi", "initialpunctuation"),
    ("Pf", "finalpunctuation"),
    ("Po", "otherpunctuation"),
    ("S", "symbol"),
    ("Sm", "mathsymbol"),
    ("Sc", "currencysymbol"),
    ("Sk", "modifiersymbol"),
    ("So", "othersymbol"),
    ("Z", "separator"),
    ("Zs", "spaceseparator"),
    ("Zl", "lineseparator"),
    ("Zp", "paragraphseparator"),
    ("C", "other"),
    ("Cc", "control"),
    ("Cf", "format"),
    ("Cs", "surrogate"),
    ("Co", "privateuse"),
    ("Cn", "unassigned"),
];

const BINARY_PROPERTIES: &[&str] = &[
    "Alphabetic",
    "Any",
    "ASCII",
    "ASCII_Hex_Digit",
    "Dash",
    "Default_Ignorable_Code_Point",
    "Diacritic",
    "Emoji",
    "Emoji_Presentation",
    "Extender",
    "Hex_Digit",
    "Ideographic",
    "Lowercase",
    "Math",
    "Noncharacter_Code_Point",
    "Uppercase",
    "White_Space",
];

const SCRIPTS: &[&str] = &[
    "Arabic",
    "Armenian",
    "Bengali",
    "Cherokee",
    "Common",
    "Cyrillic",
    "Devanagari",
    "Ethiopic",
    "Georgian",
    "Greek",
    "Gujarati",
    "Gurmukhi",
    "Han",
    "Hangul",
    "Hebrew",
    "Hiragana",
    "Inherited",
    "Kannada",
    "Katakana",
    "Khmer",
    "Lao",
    "Latin",
    "Malayalam",
    "Mongolian",
    "Myanmar",
    "Sinhala",
    "Tamil",
    "Telugu",
    "Thaana",
    "Thai",
    "Tibetan",
];
