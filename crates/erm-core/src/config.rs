//! Compiler configuration, loaded from TOML.
//!
//! ```toml
//! erm_module = "core:erm"
//! max_nesting_depth = 32
//! strict_receivers = true
//! known_receivers = ["IF", "OW"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Receivers of the classic ERM command set.
pub const DEFAULT_RECEIVERS: &[&str] = &[
    "AR", "BA", "BF", "BG", "BH", "BM", "BU", "CA", "CD", "CE", "CM", "DL", "DO", "EA", "EX",
    "FU", "HE", "HL", "HO", "HT", "IF", "IP", "LE", "MA", "MC", "MM", "MO", "MP", "MR", "MW",
    "OB", "OW", "PM", "PO", "QW", "SN", "SS", "TM", "TR", "UN", "VR", "if", "el", "en",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Module required as `ERM` by every generated chunk.
    pub erm_module: String,
    /// Module required as `VERM` by chunks of the VERM dialect.
    pub verm_module: String,
    /// Recursion ceiling for nested S-expressions.
    pub max_nesting_depth: usize,
    /// Reject generic receivers missing from `known_receivers`.
    pub strict_receivers: bool,
    pub known_receivers: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            erm_module: "core:erm".to_string(),
            verm_module: "core:verm".to_string(),
            max_nesting_depth: erm_syntax::DEFAULT_MAX_DEPTH,
            strict_receivers: false,
            known_receivers: DEFAULT_RECEIVERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CompilerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Whether a generic receiver name is accepted.
    pub fn accepts_receiver(&self, name: &str) -> bool {
        !self.strict_receivers || self.known_receivers.iter().any(|known| known == name)
    }
}
