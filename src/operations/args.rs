//! Typed access to JSON call arguments.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};

/// Arguments of one operation call. `null` values count as absent.
#[derive(Debug, Clone, Default)]
pub struct Args {
    map: Map<String, Value>,
}

impl Args {
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => Ok(Self { map }),
            other => Err(BridgeError::InvalidArgument(format!(
                "arguments must be a JSON object, got {other}"
            ))),
        }
    }

    fn present(&self, name: &str) -> Option<&Value> {
        self.map.get(name).filter(|v| !v.is_null())
    }

    pub fn opt_str(&self, name: &str) -> Result<Option<String>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(type_error(name, "a string", other)),
        }
    }

    pub fn required_str(&self, name: &str) -> Result<String> {
        self.opt_str(name)?
            .ok_or_else(|| BridgeError::InvalidArgument(format!("'{name}' is required")))
    }

    pub fn str_or(&self, name: &str, default: &str) -> Result<String> {
        Ok(self.opt_str(name)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn int_or(&self, name: &str, default: i64) -> Result<i64> {
        match self.present(name) {
            None => Ok(default),
            Some(v) => v
                .as_i64()
                .ok_or_else(|| type_error(name, "an integer", v)),
        }
    }

    pub fn opt_bool(&self, name: &str) -> Result<Option<bool>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(type_error(name, "a boolean", other)),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool> {
        Ok(self.opt_bool(name)?.unwrap_or(default))
    }

    /// A string restricted to `allowed`, with a default when absent.
    pub fn choice(&self, name: &str, allowed: &[&str], default: Option<&str>) -> Result<String> {
        let value = match (self.opt_str(name)?, default) {
            (Some(v), _) => v,
            (None, Some(d)) => d.to_string(),
            (None, None) => {
                return Err(BridgeError::InvalidArgument(format!("'{name}' is required")))
            }
        };
        if allowed.contains(&value.as_str()) {
            Ok(value)
        } else {
            Err(BridgeError::InvalidArgument(format!(
                "Invalid {name} '{value}'. Use: {}",
                allowed.join(", ")
            )))
        }
    }

    /// A filesystem path with a leading `~` expanded to the home directory.
    /// The result must be absolute, since scripts do not share our working
    /// directory.
    pub fn path_or(&self, name: &str, default: &str) -> Result<String> {
        let raw = self.str_or(name, default)?;
        let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        expand_home(&raw, home.as_deref())
            .filter(|p| p.is_absolute())
            .map(|p| p.to_string_lossy().into_owned())
            .ok_or_else(|| {
                BridgeError::InvalidArgument(format!("'{name}' must be an absolute path, got {raw:?}"))
            })
    }

    pub fn required_path(&self, name: &str) -> Result<String> {
        self.required_str(name)?;
        self.path_or(name, "")
    }
}

fn expand_home(raw: &str, home: Option<&Path>) -> Option<PathBuf> {
    if raw == "~" {
        return home.map(Path::to_path_buf);
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.map(|h| h.join(rest)),
        None => Some(PathBuf::from(raw)),
    }
}

fn type_error(name: &str, expected: &str, got: &Value) -> BridgeError {
    BridgeError::InvalidArgument(format!("'{name}' must be {expected}, got {got}"))
}
