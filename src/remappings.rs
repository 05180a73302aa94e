use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{error::Result, parse::SolData, utils};

/// The solidity compiler can only reference files that exist locally on
/// disk, so an import like `@openzeppelin/contracts/math/SafeMath.sol` has
/// to be redirected to wherever that package was installed.
///
/// A remapping maps the `name` used in import statements to its on-disk
/// `path` and is passed to solc as `name=path`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Remapping {
    pub name: String,
    pub path: String,
}

impl fmt::Display for Remapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.path)
    }
}

/// Summary of which imports in a source set could not be resolved relative
/// to their importing file and are therefore treated as external library
/// references.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryReport {
    /// How many files declare at least one external import
    pub files_with_external_imports: usize,
    /// How many files were inspected
    pub total_files: usize,
    /// The distinct unresolved import strings, sorted
    pub libraries: Vec<String>,
}

impl LibraryReport {
    /// Inspects every file's imports and records those that do not exist on
    /// disk relative to the importing file's directory.
    ///
    /// A file counts once toward `files_with_external_imports`, no matter
    /// how many of its imports are unresolved.
    pub fn resolve(files: &BTreeMap<PathBuf, String>) -> Result<Self> {
        let mut libraries = BTreeSet::new();
        let mut files_with_external_imports = 0;
        for path in files.keys() {
            let data = SolData::read(path)?;
            let dir = path.parent().unwrap_or(Path::new("."));
            let mut external = false;
            for import in &data.imports {
                let raw = utils::unquote(&import.to_string_lossy()).to_string();
                if !dir.join(&raw).exists() {
                    external = true;
                    libraries.insert(raw);
                }
            }
            if external {
                files_with_external_imports += 1;
            }
        }
        Ok(Self {
            files_with_external_imports,
            total_files: files.len(),
            libraries: libraries.into_iter().collect(),
        })
    }

    /// Derives the remappings to pass to solc: each unresolved import's
    /// first path segment is mapped to its location under the library
    /// directory. Imports starting with `.` are relative paths that simply
    /// failed to resolve and are not remapped.
    pub fn remappings(&self, lib_dir: &Path) -> Vec<Remapping> {
        let mut seen = BTreeSet::new();
        let mut remappings = Vec::new();
        for lib in &self.libraries {
            let name = match lib.split('/').next() {
                Some(name) if name != "." && name != ".." && !name.is_empty() => name,
                _ => continue,
            };
            if seen.insert(name) {
                remappings.push(Remapping {
                    name: name.to_string(),
                    path: lib_dir.join(name).to_string_lossy().into_owned(),
                });
            }
        }
        remappings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn remapping_displays_as_solc_arg() {
        let remapping =
            Remapping { name: "hardhat".to_string(), path: "/tmp/node_modules/hardhat".to_string() };
        assert_eq!(remapping.to_string(), "hardhat=/tmp/node_modules/hardhat");
    }

    #[test]
    fn resolves_external_imports() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join("A.sol"),
            "pragma solidity ^0.8.0;\nimport \"./B.sol\";\nimport \"@lib/token/Token.sol\";\ncontract A {}\n",
        )
        .unwrap();
        fs::write(tmp.path().join("B.sol"), "pragma solidity ^0.8.0;\ncontract B {}\n").unwrap();

        let files = utils::source_files(tmp.path()).unwrap();
        let report = LibraryReport::resolve(&files).unwrap();
        assert_eq!(report.total_files, 2);
        assert_eq!(report.files_with_external_imports, 1);
        assert_eq!(report.libraries, vec!["@lib/token/Token.sol".to_string()]);

        let remappings = report.remappings(Path::new("/deps/node_modules"));
        assert_eq!(remappings.len(), 1);
        assert_eq!(remappings[0].name, "@lib");
        assert_eq!(remappings[0].path, Path::new("/deps/node_modules").join("@lib").to_string_lossy());
    }

    #[test]
    fn relative_segments_are_not_remapped() {
        let report = LibraryReport {
            files_with_external_imports: 1,
            total_files: 1,
            libraries: vec!["./missing.sol".to_string(), "../up/missing.sol".to_string()],
        };
        assert!(report.remappings(Path::new("/deps")).is_empty());
    }

    #[test]
    fn missing_relative_import_counts_as_external() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join("C.sol"),
            "pragma solidity ^0.8.0;\nimport \"./missing.sol\";\ncontract C {}\n",
        )
        .unwrap();

        let files = utils::source_files(tmp.path()).unwrap();
        let report = LibraryReport::resolve(&files).unwrap();
        assert_eq!(report.files_with_external_imports, 1);
        assert_eq!(report.libraries, vec!["./missing.sol".to_string()]);
    }
}
