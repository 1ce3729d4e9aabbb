//! Configuration for docshift.
//!
//! [`Config`] is loaded exactly once at startup (defaults, then an optional
//! TOML file, then environment variables) and resolved into [`Settings`]:
//! absolute directories and an engine path. Everything downstream receives
//! [`Settings`] explicitly and never looks at the environment itself.

pub mod error;
mod resolve;

pub use crate::resolve::{
    CONTAINER_MARKER, DataDir, FALLBACK_ENGINE, PREPARED_DATA_DIR, RAW_DATA_DIR, Runtime, resolve_engine,
};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables recognised by docshift. Keys are lower-cased into
/// [`Config`] field names by figment.
pub const ENV_KEYS: [&str; 6] = [
    "RAW_DATA_DIR",
    "PREPARED_DATA_DIR",
    "LIBREOFFICE_PATH",
    "SKIP_EMPTY",
    "API_HOST",
    "API_PORT",
];

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Unresolved configuration, exactly as provided by the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub raw_data_dir: Option<PathBuf>,
    pub prepared_data_dir: Option<PathBuf>,
    pub libreoffice_path: Option<PathBuf>,
    /// Tolerate an input directory with nothing to convert.
    #[serde(deserialize_with = "flag")]
    pub skip_empty: bool,
    pub api_host: String,
    pub api_port: u16,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            raw_data_dir: None,
            prepared_data_dir: None,
            libreoffice_path: None,
            skip_empty: false,
            api_host: DEFAULT_HOST.to_string(),
            api_port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Loads configuration from an optional TOML file, overridden by the
    /// process environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(file) = file {
            if !file.is_file() {
                exn::bail!(ErrorKind::FileNotFound(file.display().to_string()));
            }
            figment = figment.merge(Toml::file(file));
        }
        Self::from_figment(figment.merge(Env::raw().only(&ENV_KEYS)))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment.extract().or_raise(|| ErrorKind::Load)
    }

    /// Resolves directories and the engine executable for the detected
    /// [`Runtime`]. Data directories are created if missing.
    pub fn resolve(self) -> Settings {
        self.resolve_for(Runtime::detect())
    }

    pub fn resolve_for(self, runtime: Runtime) -> Settings {
        Settings {
            raw_dir: RAW_DATA_DIR.resolve(self.raw_data_dir.as_deref(), runtime),
            prepared_dir: PREPARED_DATA_DIR.resolve(self.prepared_data_dir.as_deref(), runtime),
            engine: resolve_engine(self.libreoffice_path.as_deref()),
            skip_empty: self.skip_empty,
            host: self.api_host,
            port: self.api_port,
        }
    }
}

/// Fully resolved settings, shared read-only by the rest of the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Absolute path of the inbox (legacy documents).
    pub raw_dir: PathBuf,
    /// Absolute path of the outbox (converted documents).
    pub prepared_dir: PathBuf,
    /// LibreOffice executable. Might not exist!
    pub engine: PathBuf,
    pub skip_empty: bool,
    pub host: String,
    pub port: u16,
}
impl Settings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Only the (case-insensitive) string `true` enables a flag; any other
/// string or number leaves it disabled.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Number(i64),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.trim().eq_ignore_ascii_case("true"),
        Flag::Number(_) => false,
    })
}
