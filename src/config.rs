use std::path::{Path, PathBuf};

use crate::{error::Result, utils};

/// The conventional directory dependencies are installed under, a sibling of
/// the input root.
pub const LIB_DIR: &str = "node_modules";

/// Where to find all files and where to write them
#[derive(Debug, Clone)]
pub struct ProjectPathsConfig {
    /// Where to find the contract sources
    pub sources: PathBuf,
    /// Where to store build artifacts
    pub artifacts: PathBuf,
    /// Where library imports are resolved from
    pub libraries: PathBuf,
    /// The directory solc is allowed to read imports from, the parent of
    /// the sources dir
    pub allowed_path: PathBuf,
}

impl ProjectPathsConfig {
    /// Creates a new config with canonicalized paths.
    ///
    /// Both directories must already exist, the CLI layer validates this
    /// before constructing the config.
    pub fn new(sources: impl AsRef<Path>, artifacts: impl AsRef<Path>) -> Result<Self> {
        let sources = utils::canonicalize(sources)?;
        let artifacts = utils::canonicalize(artifacts)?;
        let allowed_path = sources.parent().unwrap_or(&sources).to_path_buf();
        let libraries = allowed_path.join(LIB_DIR);
        Ok(Self { sources, artifacts, libraries, allowed_path })
    }

    /// The artifact path for a source file, the base name with the extension
    /// swapped for `.json`.
    pub fn artifact(&self, file_name: &str) -> PathBuf {
        let base = file_name.strip_suffix(".sol").unwrap_or(file_name);
        self.artifacts.join(format!("{base}.json"))
    }

    /// The packed source path for a source file.
    pub fn packed(&self, file_name: &str) -> PathBuf {
        let base = file_name.strip_suffix(".sol").unwrap_or(file_name);
        self.artifacts.join(format!("{base}_packed.sol"))
    }
}
