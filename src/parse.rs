use std::{
    fs,
    path::{Path, PathBuf},
};

use solang_parser::pt::{Import, SourceUnitPart};

use crate::{
    error::{Result, SolcError},
    utils,
};

/// The directives extracted from a single solidity file: its version pragma
/// and the raw import paths it declares, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolData {
    /// The text of the solidity version pragma, e.g. `^0.8.0`, if any.
    pub version: Option<String>,
    /// Import paths as written in source, relative to the importing file.
    pub imports: Vec<PathBuf>,
}

impl SolData {
    /// Reads the file and extracts its directives.
    pub fn read(file: impl AsRef<Path>) -> Result<Self> {
        let file = file.as_ref();
        let content = fs::read_to_string(file).map_err(|err| SolcError::io(err, file))?;
        Ok(Self::parse(&content, file))
    }

    /// Extracts the version pragma and import directives from a solidity
    /// source.
    ///
    /// This will attempt to parse the solidity AST first. If parsing fails,
    /// the version is recovered by a line scan for the pragma, but the
    /// imports degrade to an empty list: a file the parser rejects is
    /// treated as having no resolvable imports.
    pub fn parse(content: &str, file: &Path) -> Self {
        let mut version = None;
        let mut imports = Vec::new();
        match solang_parser::parse(content, 0) {
            Ok((units, _)) => {
                for unit in units.0 {
                    match unit {
                        SourceUnitPart::PragmaDirective(_, Some(pragma), Some(value)) => {
                            if version.is_none() && pragma.name == "solidity" {
                                // we're only interested in the solidity version pragma
                                version = Some(value.string);
                            }
                        }
                        SourceUnitPart::ImportDirective(import) => {
                            let import = match import {
                                Import::Plain(s, _) => s,
                                Import::GlobalSymbol(s, _, _) => s,
                                Import::Rename(s, _, _) => s,
                            };
                            imports.push(PathBuf::from(import.string));
                        }
                        _ => {}
                    }
                }
            }
            Err(err) => {
                tracing::trace!(
                    "failed to parse \"{}\" ast: \"{:?}\". Falling back to regex to extract the version",
                    file.display(),
                    err
                );
                version = utils::find_version_pragma(content).map(str::to_string);
            }
        };
        Self { version, imports }
    }
}
