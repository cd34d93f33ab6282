//! Argument marshaling: typed call arguments to interpreter text.
//!
//! Every argument crosses the process boundary as a string. Booleans become
//! `"true"`/`"false"`, integers decimal text, and absent optionals the empty
//! string. Templates treat `""` as "not provided".

use crate::error::{BridgeError, Result};

/// Delimiter used when a multi-valued argument is flattened into one string.
pub const FLATTEN_DELIMITER: char = ',';

/// A single positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptArg {
    Str(String),
    Int(i64),
    Bool(bool),
    Absent,
}

impl ScriptArg {
    /// Raw argv form, used for file-mode invocations.
    pub fn to_argv(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Absent => String::new(),
        }
    }

    /// Body of a quoted literal, safe to splice between `"` delimiters of an
    /// inline template.
    pub fn to_literal_body(&self) -> String {
        match self {
            Self::Str(s) => escape_literal(s),
            other => other.to_argv(),
        }
    }
}

impl From<&str> for ScriptArg {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ScriptArg {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for ScriptArg {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for ScriptArg {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<ScriptArg>> From<Option<T>> for ScriptArg {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Absent)
    }
}

/// Escape backslashes and double quotes so the text cannot close the
/// enclosing string literal early.
pub fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

/// Marshal arguments to argv strings, in declared order.
pub fn to_argv(args: &[ScriptArg]) -> Vec<String> {
    args.iter().map(ScriptArg::to_argv).collect()
}

/// Flatten a multi-valued argument into one comma-joined string.
///
/// Segments containing the delimiter, or empty segments, are rejected since
/// the receiving template could not recover the original boundaries.
pub fn flatten<S: AsRef<str>>(segments: &[S]) -> Result<String> {
    let mut parts = Vec::with_capacity(segments.len());
    for seg in segments {
        let seg = seg.as_ref().trim();
        if seg.is_empty() {
            return Err(BridgeError::InvalidArgument(
                "empty segment in multi-valued argument".to_string(),
            ));
        }
        if seg.contains(FLATTEN_DELIMITER) {
            return Err(BridgeError::InvalidArgument(format!(
                "segment '{seg}' contains reserved delimiter '{FLATTEN_DELIMITER}'"
            )));
        }
        parts.push(seg);
    }
    Ok(parts.join(FLATTEN_DELIMITER.to_string().as_str()))
}

/// Split a `/`-separated mailbox path and flatten it for a template.
pub fn flatten_path(path: &str) -> Result<String> {
    let segments: Vec<&str> = path.split('/').collect();
    flatten(&segments)
}
