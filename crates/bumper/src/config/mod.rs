pub mod defaults;
pub mod global;
pub mod regex;
pub mod toml;
pub mod version;

pub use global::{GlobalConfig, GlobalConfigFinalized};
pub use version::{VersionComponentConfigs, VersionComponentSpec};

use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read config file {path:?}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config file {path:?}")]
    Toml {
        #[source]
        source: toml::ParseError,
        path: PathBuf,
    },
    #[error(transparent)]
    Diagnostics(#[from] crate::diagnostics::Error),
    #[error("failed to parse config file in the background")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigFile {
    /// A `.bumper.toml` or `bumper.toml` configuration file with a `[bumper]` table
    BumperToml(PathBuf),
    /// A `pyproject.toml` configuration file with a `[tool.bumper]` table
    PyProject(PathBuf),
}

impl ConfigFile {
    /// Classify a config file by its file name.
    ///
    /// Any file named `pyproject.toml` is read from `[tool.bumper]`,
    /// everything else from `[bumper]`.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.file_name().is_some_and(|name| name == "pyproject.toml") {
            Self::PyProject(path)
        } else {
            Self::BumperToml(path)
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::BumperToml(path) | Self::PyProject(path) => path.as_ref(),
        }
    }

    #[must_use]
    pub fn table_path(&self) -> toml::TablePath {
        match self {
            Self::BumperToml(_) => toml::TablePath::Root,
            Self::PyProject(_) => toml::TablePath::Tool,
        }
    }
}

impl std::fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

/// Default config file locations in order of precedence.
pub fn config_file_locations(dir: &Path) -> impl Iterator<Item = ConfigFile> + use<'_> {
    [
        ConfigFile::BumperToml(dir.join(".bumper.toml")),
        ConfigFile::BumperToml(dir.join("bumper.toml")),
        ConfigFile::PyProject(dir.join("pyproject.toml")),
    ]
    .into_iter()
}

pub trait MergeWith<T> {
    fn merge_with(&mut self, other: T);
}

impl<'a, T> MergeWith<Option<&'a T>> for Option<T>
where
    T: Clone,
{
    fn merge_with(&mut self, other: Option<&'a T>) {
        if self.is_none() {
            *self = other.cloned();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub global: GlobalConfig,
    pub components: VersionComponentConfigs,
}

impl<'a> MergeWith<&'a Config> for Config {
    fn merge_with(&mut self, other: &'a Config) {
        self.global.merge_with(&other.global);
        for (name, spec) in &other.components {
            self.components
                .entry(name.clone())
                .or_insert_with(|| spec.clone());
        }
    }
}

impl Config {
    /// Finalize the config.
    ///
    /// All unset configuration options will be set to their default value.
    #[must_use]
    pub fn finalize(self) -> FinalizedConfig {
        FinalizedConfig {
            global: self.global.finalize(),
            components: self.components,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizedConfig {
    pub global: GlobalConfigFinalized,
    pub components: VersionComponentConfigs,
}
