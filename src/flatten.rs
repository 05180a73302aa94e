//! Packed-source output: inlines all resolvable imports of a file into one
//! self-contained source text, for tools that require one flat file.

use std::{
    collections::BTreeSet,
    fs,
    ops::Range,
    path::{Path, PathBuf},
};

use crate::{
    error::{Result, SolcError},
    utils,
};

/// Produces the packed source for the given file: its version pragma
/// followed by the recursively inlined bodies of all its imports.
///
/// Imports are resolved against the importing file's directory first and the
/// library directory second; pragma and import statements of inlined files
/// are stripped. If any import along the way cannot be resolved, or the
/// imports form a cycle, the whole operation fails and nothing is emitted.
pub fn flatten(file: &Path, lib_dir: &Path) -> Result<String> {
    let content = fs::read_to_string(file).map_err(|err| SolcError::io(err, file))?;
    let pragma = utils::RE_SOL_PRAGMA
        .find(&content)
        .ok_or(SolcError::PragmaNotFound)?
        .as_str()
        .to_string();
    let mut pending = BTreeSet::new();
    let body = inline(file, lib_dir, &mut pending)?;
    Ok(format!("{pragma}\n{body}"))
}

/// `pending` holds the canonical paths currently being inlined further up
/// the recursion, so a cycle is caught on re-entry. A file imported twice
/// along independent paths is still inlined twice.
fn inline(file: &Path, lib_dir: &Path, pending: &mut BTreeSet<PathBuf>) -> Result<String> {
    let canonical = utils::canonicalize(file)?;
    if !pending.insert(canonical.clone()) {
        return Err(SolcError::CircularImport(canonical))
    }

    let content = fs::read_to_string(file).map_err(|err| SolcError::io(err, file))?;
    let mut rest = utils::RE_SOL_PRAGMA.replace_all(&content, "").into_owned();
    let dir = file.parent().unwrap_or(Path::new("."));

    let mut result = String::new();
    while let Some((range, raw)) = next_import(&rest) {
        rest.replace_range(range, "");
        let import = utils::unquote(&raw);
        let local = dir.join(import);
        let target = if local.exists() {
            local
        } else {
            let lib = lib_dir.join(import);
            if lib.exists() {
                lib
            } else {
                return Err(SolcError::UnresolvableImport(
                    file.to_path_buf(),
                    PathBuf::from(import),
                ))
            }
        };
        result.push_str(&inline(&target, lib_dir, pending)?);
    }
    result.push_str(&rest);
    pending.remove(&canonical);
    Ok(result)
}

/// Finds the first import statement of either form and returns the byte
/// range of the whole statement together with the raw import path.
fn next_import(content: &str) -> Option<(Range<usize>, String)> {
    let mut found: Option<(Range<usize>, String)> = None;
    for re in [&*utils::RE_SOL_IMPORT_FROM, &*utils::RE_SOL_IMPORT] {
        if let Some(caps) = re.captures(content) {
            let whole = caps.get(0).unwrap();
            if found.as_ref().map(|(range, _)| whole.start() < range.start).unwrap_or(true) {
                found = Some((
                    whole.range(),
                    caps.name("path").unwrap().as_str().to_string(),
                ));
            }
        }
    }
    found
}
