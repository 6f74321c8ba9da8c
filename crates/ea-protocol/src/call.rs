//! Call expression extraction and parsing.
//!
//! The intent generator is asked to answer with `UUU_: op("a", None)`.
//! Nothing guarantees it does, so both stages here are total: every
//! input yields either a value or a `CallError`.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CallError, CallResult};

/// Token the generator places in front of the call expression.
pub const MARKER: &str = "UUU_:";

/// Reasoning models wrap their scratch work in `<think>` tags. Truncated
/// output may never close the tag; then the block runs to the end.
static REASONING_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?(?:</think>|\z)").expect("static regex"));

/// Remove `<think>…</think>` blocks, and an unclosed trailing
/// `<think>…`, from raw generator output.
pub fn strip_reasoning(raw: &str) -> Cow<'_, str> {
    REASONING_BLOCK.replace_all(raw, "")
}

/// Isolate the candidate call expression that follows [`MARKER`].
///
/// Only the first marker counts. The remainder is trimmed but otherwise
/// untouched; syntax is checked by [`parse_call`].
pub fn extract_call(raw: &str) -> CallResult<String> {
    let cleaned = strip_reasoning(raw);
    let Some(index) = cleaned.find(MARKER) else {
        return Err(CallError::MarkerMissing(MARKER));
    };

    let call = cleaned[index + MARKER.len()..].trim();
    if call.is_empty() {
        return Err(CallError::EmptyCall);
    }
    Ok(call.to_string())
}

// ── Parsed call ───────────────────────────────────────────────

/// A single positional argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallArg {
    /// A string literal, quoted or bare.
    Text(String),
    /// The unquoted literal `None`.
    None,
}

impl CallArg {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::None => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for CallArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::None => f.write_str("None"),
        }
    }
}

/// Operation name plus positional arguments, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCall {
    pub name: String,
    pub args: Vec<CallArg>,
}

impl fmt::Display for ParsedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// Parse `name(arg, ...)` into a [`ParsedCall`].
///
/// Splits at the first `(`, drops exactly one trailing `)`, then splits
/// the argument list on commas that sit outside quotes. Each argument
/// loses surrounding whitespace and one layer of matching `"` or `'`.
pub fn parse_call(expr: &str) -> CallResult<ParsedCall> {
    let expr = expr.trim();
    let Some((name, rest)) = expr.split_once('(') else {
        return Err(CallError::MissingOpenParen(expr.to_string()));
    };
    let Some(inner) = rest.trim_end().strip_suffix(')') else {
        return Err(CallError::MissingCloseParen(expr.to_string()));
    };

    let name = name.trim();
    if !is_identifier(name) {
        return Err(CallError::InvalidName(name.to_string()));
    }

    let args = split_args(inner)?
        .into_iter()
        .enumerate()
        .map(|(i, token)| to_arg(i + 1, token))
        .collect::<CallResult<Vec<_>>>()?;

    Ok(ParsedCall {
        name: name.to_string(),
        args,
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split on top-level commas. A quote only opens at the start of a token,
/// so apostrophes inside bare words are plain characters.
fn split_args(inner: &str) -> CallResult<Vec<&str>> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut tokens = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut at_token_start = true;

    for (i, c) in inner.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                ',' => {
                    tokens.push(&inner[start..i]);
                    start = i + 1;
                    at_token_start = true;
                    continue;
                }
                '"' | '\'' if at_token_start => quote = Some(c),
                c if c.is_whitespace() => continue,
                _ => {}
            },
        }
        at_token_start = false;
    }

    if quote.is_some() {
        return Err(CallError::UnterminatedQuote {
            position: tokens.len() + 1,
        });
    }
    tokens.push(&inner[start..]);
    Ok(tokens)
}

fn to_arg(position: usize, token: &str) -> CallResult<CallArg> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CallError::EmptyArgument { position });
    }
    if token == "None" {
        return Ok(CallArg::None);
    }
    Ok(CallArg::Text(unquote(token).to_string()))
}

fn unquote(token: &str) -> &str {
    for q in ['"', '\''] {
        if token.len() >= 2 && token.starts_with(q) && token.ends_with(q) {
            return &token[1..token.len() - 1];
        }
    }
    token
}
