//! Resolution of the dependency graph for a contract directory.
//!
//! Each node is a solidity file, edges point from an imported file to the
//! file importing it, so an edge reads "is a prerequisite of". Imports that
//! do not resolve to a file on disk become synthetic missing nodes so they
//! still show up in the rendered graph.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use crate::{
    error::{Result, SolcError},
    parse::SolData,
    utils,
};

/// A node in the dependency graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// Canonical path of the file, or the unresolved path for missing nodes
    pub path: PathBuf,
    /// The file name as discovered by the scanner
    pub name: Option<String>,
    /// The version pragma text, if the file exists and declares one
    pub version: Option<String>,
}

impl Node {
    /// Whether this node stands in for an import that has no file on disk.
    pub fn is_missing(&self) -> bool {
        self.name.is_none()
    }
}

/// The resolved dependency graph of a scanned source set.
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    /// (from, to) pairs indexing into `nodes`, from the import target to
    /// the importing file
    edges: Vec<(usize, usize)>,
    /// maps a path to its index in `nodes`, for fast lookup
    indices: HashMap<PathBuf, usize>,
}

impl Graph {
    /// Gets a node by index.
    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// All nodes, scanned files first, missing nodes after.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges as (import target, importer) index pairs.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Returns the node index for a path, if present.
    pub fn index_of(&self, path: &Path) -> Option<usize> {
        self.indices.get(path).copied()
    }

    /// Builds the graph for the scanned file set.
    ///
    /// Every raw import is joined to the importing file's directory and
    /// canonicalized, so two import strings naming the same file on disk
    /// resolve to the same node. An import with no file behind it is
    /// recorded as a missing node, created at most once per distinct
    /// unresolved path.
    pub fn build(files: &BTreeMap<PathBuf, String>) -> Result<Graph> {
        let mut nodes = Vec::with_capacity(files.len());
        let mut indices = HashMap::with_capacity(files.len());
        let mut imports = Vec::with_capacity(files.len());
        for (path, name) in files {
            let data = SolData::read(path)?;
            indices.insert(path.clone(), nodes.len());
            nodes.push(Node {
                path: path.clone(),
                name: Some(name.clone()),
                version: data.version,
            });
            imports.push(data.imports);
        }

        let mut edges = Vec::new();
        for (path, file_imports) in files.keys().zip(imports) {
            let importer = indices[path];
            let dir = path.parent().unwrap_or(Path::new("."));
            for import in &file_imports {
                let raw = dir.join(utils::unquote(&import.to_string_lossy()));
                let target = match utils::canonicalize(&raw) {
                    Ok(resolved) => *indices.entry(resolved.clone()).or_insert_with(|| {
                        // resolves on disk but was not scanned
                        nodes.push(Node { path: resolved, name: None, version: None });
                        nodes.len() - 1
                    }),
                    Err(_) => *indices.entry(raw.clone()).or_insert_with(|| {
                        nodes.push(Node { path: raw, name: None, version: None });
                        nodes.len() - 1
                    }),
                };
                edges.push((target, importer));
            }
        }

        Ok(Graph { nodes, edges, indices })
    }

    /// Counts, for every scanned file, how often it is resolved as an
    /// import target of another file in the set.
    ///
    /// A count of zero means the file is imported by nobody; those are the
    /// files the leaf-only build driver compiles. Note this deliberately
    /// counts incoming references, not the file's own imports.
    pub fn fan_in(files: &BTreeMap<PathBuf, String>) -> Result<BTreeMap<PathBuf, usize>> {
        let graph = Self::build(files)?;
        let mut counts: BTreeMap<PathBuf, usize> =
            files.keys().map(|path| (path.clone(), 0)).collect();
        for (target, _) in &graph.edges {
            let node = graph.node(*target);
            if let Some(count) = counts.get_mut(&node.path) {
                *count += 1;
            }
        }
        Ok(counts)
    }

    /// Emits the graph in DOT format with record-shaped node labels,
    /// missing nodes labeled `404`.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("// The Dependency Graph\ndigraph {\n    node [shape=record];\n");
        for node in &self.nodes {
            let path = node.path.display();
            match &node.name {
                Some(name) => {
                    let version = node.version.as_deref().unwrap_or("unknown version");
                    dot.push_str(&format!(
                        "    \"{path}\" [label=\"{{{name}|path: {path}|version: {version}}}\"];\n"
                    ));
                }
                None => {
                    dot.push_str(&format!("    \"{path}\" [label=\"{{404|path: {path}}}\"];\n"));
                }
            }
        }
        for (from, to) in &self.edges {
            dot.push_str(&format!(
                "    \"{}\" -> \"{}\";\n",
                self.nodes[*from].path.display(),
                self.nodes[*to].path.display()
            ));
        }
        dot.push_str("}\n");
        dot
    }

    /// Writes `DependencyGraph.gv` to the output directory and asks the
    /// external `dot` renderer to rasterize it to `DependencyGraph.png`.
    pub fn render(&self, out_dir: &Path) -> Result<PathBuf> {
        let gv = out_dir.join("DependencyGraph.gv");
        let png = out_dir.join("DependencyGraph.png");
        fs::write(&gv, self.to_dot()).map_err(|err| SolcError::io(err, &gv))?;
        let output = Command::new("dot")
            .arg("-Tpng")
            .arg(&gv)
            .arg("-o")
            .arg(&png)
            .output()
            .map_err(|err| SolcError::GraphRender(err.to_string()))?;
        if !output.status.success() {
            return Err(SolcError::GraphRender(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ))
        }
        Ok(png)
    }
}
