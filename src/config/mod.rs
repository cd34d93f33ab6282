use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use directories::BaseDirs;

use crate::bridge::invoker::{DEFAULT_INLINE_FLAG, DEFAULT_INTERPRETER, DEFAULT_TIMEOUT};

pub const INTERPRETER: &str = "MAIL_BRIDGE_INTERPRETER";
pub const INLINE_FLAG: &str = "MAIL_BRIDGE_INLINE_FLAG";
pub const SCRIPT_ROOT: &str = "MAIL_BRIDGE_SCRIPT_ROOT";
pub const TIMEOUT: &str = "MAIL_BRIDGE_TIMEOUT";
pub const USER_PREFERENCES: &str = "USER_EMAIL_PREFERENCES";

/// Settings read once at start-up: defaults, then the rc file, then the
/// environment. Nothing re-reads the environment afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let config_path = default_config_path();
        let mut cfg = Self { inner: default_map(), config_path };
        let path = cfg.config_path.clone();
        cfg.merge_file(&path);

        // Environment takes precedence over the rc file.
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                cfg.inner.insert(k, v);
            }
        }
        cfg
    }

    /// Defaults overlaid with explicit pairs; ignores the rc file and
    /// environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut inner = default_map();
        for (k, v) in pairs {
            inner.insert(k.into(), v.into());
        }
        Self { inner, config_path: default_config_path() }
    }

    fn merge_file(&mut self, path: &Path) {
        let Ok(file) = fs::File::open(path) else {
            return;
        };
        tracing::debug!("reading config from {}", path.display());
        let reader = BufReader::new(file);
        for line in reader.lines().map_while(Result::ok) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((k, v)) = line.split_once('=') {
                self.inner.insert(k.trim().to_string(), v.trim().to_string());
            }
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).filter(|v| !v.is_empty()).map(PathBuf::from)
    }

    pub fn interpreter(&self) -> String {
        self.get(INTERPRETER)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string())
    }

    pub fn inline_flag(&self) -> String {
        self.get(INLINE_FLAG)
            .unwrap_or_else(|| DEFAULT_INLINE_FLAG.to_string())
    }

    pub fn script_root(&self) -> PathBuf {
        self.get_path(SCRIPT_ROOT).unwrap_or_else(default_script_root)
    }

    pub fn timeout(&self) -> Duration {
        self.get_u64(TIMEOUT)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Free-text user preferences, if any were configured.
    pub fn preferences(&self) -> Option<String> {
        self.get(USER_PREFERENCES)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

fn is_config_key(k: &str) -> bool {
    k == USER_PREFERENCES || k.starts_with("MAIL_BRIDGE_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("mailbridge").join(".mailbridgerc")
}

/// Scripts shipped next to the binary win; a build checkout falls back to
/// its own `scripts/` directory.
fn default_script_root() -> PathBuf {
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    installed_script_root(exe_dir.as_deref())
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scripts"))
}

fn installed_script_root(exe_dir: Option<&Path>) -> Option<PathBuf> {
    let exe_dir = exe_dir?;
    [
        exe_dir.join("scripts"),
        exe_dir.join("..").join("share").join("mailbridge").join("scripts"),
    ]
    .into_iter()
    .find(|candidate| candidate.is_dir())
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert(INTERPRETER.into(), DEFAULT_INTERPRETER.into());
    m.insert(INLINE_FLAG.into(), DEFAULT_INLINE_FLAG.into());
    m.insert(TIMEOUT.into(), DEFAULT_TIMEOUT.as_secs().to_string());
    m.insert(
        SCRIPT_ROOT.into(),
        default_script_root().to_string_lossy().into_owned(),
    );
    m
}
