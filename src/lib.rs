//! Batch build driver for directories of solidity contracts.
//!
//! Scans an input directory for `*.sol` files, determines each file's
//! compiler version from its pragma, switches the active `solc` via
//! `solc-select` as needed, derives import remappings for external library
//! references and invokes `solc` once per file in combined-json mode. Can
//! also render the inter-file dependency graph and emit flattened
//! ("packed") single-file sources.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use semver::Version;

mod compile;
pub use compile::Solc;

pub mod config;
pub use config::ProjectPathsConfig;

pub mod error;
pub mod flatten;
pub mod graph;
pub mod parse;
pub mod remappings;
pub mod utils;

use error::{Result, SolcError};
use graph::Graph;
use parse::SolData;
use remappings::LibraryReport;

/// Handles contract compiling
#[derive(Debug)]
pub struct Project {
    /// The layout of the project
    pub paths: ProjectPathsConfig,
    /// Where to find solc and solc-select
    pub solc: Solc,
}

impl Project {
    pub fn new(paths: ProjectPathsConfig) -> Self {
        Self { paths, solc: Solc::default() }
    }

    /// Returns all sources found under the project's input path, mapped to
    /// their file names.
    pub fn sources(&self) -> Result<BTreeMap<PathBuf, String>> {
        utils::source_files(&self.paths.sources)
    }

    /// Compiles every discovered file.
    pub fn compile_all(&self) -> Result<()> {
        let files = self.sources()?;
        let selection: Vec<_> = files.keys().cloned().collect();
        self.compile_files(&files, selection)
    }

    /// Compiles only the files that are imported by nobody else in the set,
    /// see [`Graph::fan_in`].
    pub fn compile_leaves(&self) -> Result<()> {
        let files = self.sources()?;
        let selection: Vec<_> = Graph::fan_in(&files)?
            .into_iter()
            .filter(|(_, count)| *count == 0)
            .map(|(path, _)| path)
            .collect();
        self.compile_files(&files, selection)
    }

    /// Compiles exactly the named contract, `Token` meaning `Token.sol`
    /// anywhere under the input dir.
    pub fn compile_contract(&self, name: &str) -> Result<()> {
        let files = self.sources()?;
        let target = files
            .iter()
            .find(|(_, file_name)| file_name.strip_suffix(".sol") == Some(name))
            .map(|(path, _)| path.clone())
            .ok_or_else(|| SolcError::ContractNotFound(name.to_string()))?;
        self.compile_files(&files, vec![target])
    }

    /// Shared per-file build sequence used by all entry points.
    ///
    /// Remappings are derived once from the whole directory, and the solc
    /// version is switched lazily: only when a file requires a version
    /// different from the one activated last.
    fn compile_files(
        &self,
        files: &BTreeMap<PathBuf, String>,
        selection: Vec<PathBuf>,
    ) -> Result<()> {
        if selection.is_empty() {
            tracing::info!("nothing to compile");
            return Ok(())
        }

        if !self.paths.libraries.exists() {
            fs::create_dir_all(&self.paths.libraries)
                .map_err(|err| SolcError::io(err, &self.paths.libraries))?;
        }
        let report = LibraryReport::resolve(files)?;
        tracing::debug!("library report: {}", serde_json::to_string(&report)?);
        let remappings = report.remappings(&self.paths.libraries);

        let mut active: Option<Version> = None;
        for path in selection {
            let name = &files[&path];
            let artifact = self.paths.artifact(name);
            if is_built(&artifact) {
                tracing::info!("{} already built, skipping", name);
                continue
            }

            let data = SolData::read(&path)?;
            let version = match data.version {
                Some(version) => version,
                None => {
                    tracing::error!("unable to identify solidity version of {}", name);
                    continue
                }
            };
            if let Err(err) = self.solc.ensure_version(&version, &mut active) {
                tracing::error!("could not activate solc {} for {}: {}", version, name, err);
                continue
            }

            tracing::info!("compiling {}", name);
            self.solc.compile_file(&path, &remappings, &self.paths.allowed_path, &artifact)?;
        }
        Ok(())
    }

    /// Builds the dependency graph and renders it to
    /// `<output>/DependencyGraph.png`, returning the image path.
    pub fn write_dependency_graph(&self) -> Result<PathBuf> {
        let files = self.sources()?;
        let graph = Graph::build(&files)?;
        graph.render(&self.paths.artifacts)
    }

    /// Writes `<name>_packed.sol` for every source file whose imports all
    /// resolve; files that fail to pack are logged and skipped, with
    /// nothing written for them.
    pub fn pack_all(&self) -> Result<()> {
        let files = self.sources()?;
        for (path, name) in &files {
            match flatten::flatten(path, &self.paths.libraries) {
                Ok(packed) => {
                    let target = self.paths.packed(name);
                    fs::write(&target, packed).map_err(|err| SolcError::io(err, &target))?;
                }
                Err(err) => {
                    tracing::error!("could not pack {}: {}", name, err);
                }
            }
        }
        Ok(())
    }
}

/// The best-effort artifact check: a file counts as already built when its
/// artifact exists and is non-empty. There is no content validation, so a
/// partial artifact from a crashed compile passes this check until deleted.
pub fn is_built(artifact: &Path) -> bool {
    fs::metadata(artifact).map(|meta| meta.len() > 0).unwrap_or(false)
}
