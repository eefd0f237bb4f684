use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use playground_package::InstallOptions;
use serde::{Deserialize, Serialize};

/// Errors that may occur while loading a [`HarnessConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unable to read \"{}\"", path.display())]
    Read {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("Unable to parse the configuration")]
    Parse(#[from] toml::de::Error),
}

/// Everything the harness needs to know about the distribution it runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HarnessConfig {
    pub archive: ArchiveConfig,
    pub interpreter: InterpreterConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ArchiveConfig {
    /// Name of the `*.tar.gz` entry inside the zip archive.
    pub entry: String,
    pub strip_components: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            entry: "ruby.wasm.tar.gz".to_string(),
            strip_components: 1,
        }
    }
}

impl ArchiveConfig {
    pub fn install_options(&self) -> InstallOptions {
        InstallOptions::new(self.entry.clone()).with_strip_components(self.strip_components)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InterpreterConfig {
    /// Location of the interpreter module inside the installed filesystem.
    pub path: String,
    /// `argv[0]` for every run.
    pub program_name: String,
    /// Environment variables passed to every run.
    pub env: BTreeMap<String, String>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            path: "/usr/local/bin/ruby".to_string(),
            program_name: "ruby".to_string(),
            env: BTreeMap::new(),
        }
    }
}

impl HarnessConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;

        HarnessConfig::from_toml_str(&contents)
    }
}
