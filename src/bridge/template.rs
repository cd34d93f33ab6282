//! Template store: script identifiers to concrete source or file paths.

use std::path::{Component, Path, PathBuf};

use super::marshal::ScriptArg;
use crate::error::{BridgeError, Result};

/// Resolves file-mode templates under a fixed root.
///
/// Nothing is cached; every lookup hits the filesystem once.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` (e.g. `search/search_emails.applescript`) to a path
    /// that exists under the root.
    pub fn resolve(&self, relative: &Path) -> Result<PathBuf> {
        let full = self.root.join(relative);
        // Only plain descending paths stay inside the root.
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !contained || !full.is_file() {
            return Err(BridgeError::TemplateNotFound(full));
        }
        tracing::debug!(path = %full.display(), "resolved script template");
        Ok(full)
    }
}

/// Render an inline template by replacing `{{name}}` placeholders.
///
/// Values are spliced as escaped literal bodies, so placeholders are meant to
/// sit inside double quotes. Placeholders without a binding are left as-is.
/// Substitution is a single pass over `source`; text coming from a value is
/// never scanned for placeholders.
pub fn render(source: &str, bindings: &[(&str, ScriptArg)]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let bound = after.find("}}").and_then(|end| {
            let name = &after[..end];
            bindings
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, value)| (end, value))
        });
        match bound {
            Some((end, value)) => {
                out.push_str(&value.to_literal_body());
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
