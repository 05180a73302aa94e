//! Utility functions

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::error::{Result, SolcError};
use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

/// A regex that matches the concrete version part of a solidity version
/// pragma as follows: `pragma solidity ^0.5.2;` => `0.5.2`
pub static RE_SOL_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"0\.[0-9.]*").unwrap());

/// A regex that matches a whole solidity version pragma statement:
/// `pragma solidity ^0.5.2;`
pub static RE_SOL_PRAGMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pragma\s+solidity\s+[^;]+;").unwrap());

/// A regex that matches the import path of a plain solidity import
/// statement with the named group "path": `import "./A.sol";`
pub static RE_SOL_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s*(?P<path>\S+)\s*;"#).unwrap());

/// A regex that matches the import path of a symbol import with the named
/// group "path": `import {A} from "./A.sol";`
pub static RE_SOL_IMPORT_FROM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s*\S+(?:\s*\{[^}]*\})?\s*from\s*(?P<path>\S+)\s*;"#).unwrap());

/// Scans the given source line by line for a version pragma and returns the
/// concrete version number it mentions, `pragma solidity ^0.8.0;` => `0.8.0`.
///
/// This is the fallback used when the solidity parser rejects the file.
pub fn find_version_pragma(contract: &str) -> Option<&str> {
    let line = contract
        .lines()
        .find(|line| line.contains("pragma") && RE_SOL_VERSION.is_match(line))?;
    RE_SOL_VERSION.find(line).map(|m| m.as_str())
}

/// Extracts the concrete `0.x.y` version from a pragma value such as
/// `^0.8.0` or `>=0.4.22 <0.6.0`, taking the first match.
pub fn clean_version(version: &str) -> Option<&str> {
    RE_SOL_VERSION.find(version).map(|m| m.as_str())
}

/// Returns a mapping from absolute path to file name for all the solidity
/// files under the root, recursing into subdirectories.
///
/// NOTE: symlinks are not followed, so a cyclic symlink structure cannot
/// cause unbounded recursion here.
///
/// # Example
///
/// ```no_run
/// use solbuild::utils;
/// let sources = utils::source_files("./contracts").unwrap();
/// ```
pub fn source_files(root: impl AsRef<Path>) -> Result<BTreeMap<PathBuf, String>> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue
        }
        let path = entry.path();
        if path.extension().map(|ext| ext == "sol").unwrap_or_default() {
            let name = entry.file_name().to_string_lossy().into_owned();
            files.insert(canonicalize(path)?, name);
        }
    }
    Ok(files)
}

/// Returns the same path config but with canonicalized paths.
///
/// This uses [`dunce`] to ensure windows paths stay usable and also resolves
/// symlinks, so two import strings naming the same file on disk map to the
/// same canonical path.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    dunce::canonicalize(path).map_err(|err| SolcError::io(err, path))
}

/// Strips the quote characters an import path is written with in source.
pub fn unquote(raw: &str) -> &str {
    raw.trim_matches(|c| c == '"' || c == '\'')
}
