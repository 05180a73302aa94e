use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolcError>;

/// Various error types
#[derive(Debug, Error)]
pub enum SolcError {
    /// Errors related to the solc executable itself
    #[error("solc error: {0}")]
    SolcError(String),
    #[error("missing pragma from solidity file")]
    PragmaNotFound,
    #[error("could not activate solc version \"{0}\"")]
    VersionNotFound(String),
    #[error("no contract named \"{0}\" found")]
    ContractNotFound(String),
    #[error("failed to render dependency graph: {0}")]
    GraphRender(String),
    #[error("could not flatten \"{0}\": unresolvable import \"{1}\"")]
    UnresolvableImport(PathBuf, PathBuf),
    #[error("could not flatten: circular import of \"{0}\"")]
    CircularImport(PathBuf),
    #[error(transparent)]
    SemverError(#[from] semver::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    /// Filesystem IO error
    #[error(transparent)]
    Io(#[from] SolcIoError),
    #[error(transparent)]
    WalkdirError(#[from] walkdir::Error),
}

impl SolcError {
    pub(crate) fn io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        SolcIoError::new(err, path).into()
    }
    pub(crate) fn solc(msg: impl Into<String>) -> Self {
        SolcError::SolcError(msg.into())
    }
}

#[derive(Debug, Error)]
#[error("\"{}\": {io}", self.path.display())]
pub struct SolcIoError {
    io: io::Error,
    path: PathBuf,
}

impl SolcIoError {
    pub fn new(io: io::Error, path: impl Into<PathBuf>) -> Self {
        Self { io, path: path.into() }
    }
}

impl From<SolcIoError> for io::Error {
    fn from(err: SolcIoError) -> Self {
        err.io
    }
}
