//! Graph instances and their normalized adjacency structure.
//!
//! Instance files are DIMACS-like: `c` comment lines, one
//! `p <kind> <vertices> <edges>` problem line and `e <u> <v>` edge lines.
//! Whether vertex ids start at 0 or 1 is detected from the edge list, never
//! from the file name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult, InstanceError};

/// File extensions stripped from instance file names to form instance ids.
const INSTANCE_EXTENSIONS: [&str; 2] = [".col", ".gph"];

/// Index base detected from an instance's edge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBase {
    Zero,
    One,
}

impl IndexBase {
    /// Offset subtracted from every raw vertex id.
    pub const fn offset(self) -> usize {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }
}

/// An undirected graph with 0-based vertex ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    vertex_count: usize,
    edges: Vec<(usize, usize)>,
    base: IndexBase,
}

impl Graph {
    /// Parse instance text, detecting the index base from its edges.
    ///
    /// A single zero-valued endpoint anywhere in the edge list marks the
    /// whole file as 0-indexed; otherwise every id is shifted down by one.
    pub fn parse(text: &str) -> Result<Self, InstanceError> {
        let mut vertex_count = None;
        let mut raw_edges = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            let mut tokens = trimmed.split_whitespace();
            match tokens.next() {
                Some("p") => {
                    let tokens: Vec<&str> = tokens.collect();
                    // `p edge 10 20`; some generators omit the kind.
                    let count = match tokens.as_slice() {
                        [_, n, _, ..] => n,
                        [n, _] => n,
                        _ => return Err(malformed(line_no, trimmed)),
                    };
                    vertex_count = Some(
                        count
                            .parse::<usize>()
                            .map_err(|_| malformed(line_no, trimmed))?,
                    );
                }
                Some("e") => {
                    let u = tokens.next().and_then(|t| t.parse::<usize>().ok());
                    let v = tokens.next().and_then(|t| t.parse::<usize>().ok());
                    match (u, v) {
                        (Some(u), Some(v)) => raw_edges.push((line_no, u, v)),
                        _ => return Err(malformed(line_no, trimmed)),
                    }
                }
                // Comments, blank lines and records we do not use (`n`, `x`).
                _ => {}
            }
        }

        let vertex_count = vertex_count.ok_or(InstanceError::MissingProblemLine)?;
        let base = if raw_edges.iter().any(|&(_, u, v)| u == 0 || v == 0) {
            IndexBase::Zero
        } else {
            IndexBase::One
        };

        let offset = base.offset();
        let mut edges = Vec::with_capacity(raw_edges.len());
        for (line, u, v) in raw_edges {
            for vertex in [u, v] {
                if vertex - offset >= vertex_count {
                    return Err(InstanceError::VertexOutOfRange {
                        line,
                        vertex,
                        vertex_count,
                    });
                }
            }
            edges.push((u - offset, v - offset));
        }

        Ok(Self {
            vertex_count,
            edges,
            base,
        })
    }

    /// Read and parse an instance file.
    pub fn from_file(path: &Path) -> DomainResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DomainError::io(path, e))?;
        Ok(Self::parse(&text)?)
    }

    pub const fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Normalized (0-based) edges in file order.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Index base the file was written in.
    pub const fn base(&self) -> IndexBase {
        self.base
    }

    /// Build the adjacency structure used by the verifier.
    pub fn adjacency(&self) -> Adjacency {
        Adjacency::from_edges(self.vertex_count, &self.edges)
    }
}

fn malformed(line: usize, content: &str) -> InstanceError {
    InstanceError::MalformedLine {
        line,
        content: content.to_string(),
    }
}

/// Sorted, de-duplicated neighbor lists for every vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjacency {
    neighbors: Vec<Vec<usize>>,
}

impl Adjacency {
    /// Build from 0-based edges. Self loops are dropped.
    pub fn from_edges(vertex_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut neighbors = vec![Vec::new(); vertex_count];
        for &(u, v) in edges {
            if u == v {
                continue;
            }
            neighbors[u].push(v);
            neighbors[v].push(u);
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        Self { neighbors }
    }

    pub fn vertex_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Whether `u` and `v` share an edge. Out-of-range ids are never adjacent.
    pub fn are_adjacent(&self, u: usize, v: usize) -> bool {
        self.neighbors
            .get(u)
            .is_some_and(|list| list.binary_search(&v).is_ok())
    }

    pub fn neighbors(&self, u: usize) -> &[usize] {
        self.neighbors.get(u).map_or(&[], Vec::as_slice)
    }

    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }
}

/// Instance id for an instance file name: the name minus `.col`/`.gph`.
pub fn instance_id(file_name: &str) -> String {
    INSTANCE_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .unwrap_or(file_name)
        .to_string()
}

/// Lookup from instance file name to its path on disk.
#[derive(Debug, Clone, Default)]
pub struct InstanceIndex {
    by_file_name: HashMap<String, PathBuf>,
}

impl InstanceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path under its file name. The first path registered wins.
    pub fn insert(&mut self, path: PathBuf) {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            self.by_file_name.entry(name.to_string()).or_insert(path);
        }
    }

    /// Find an instance by file name (`myciel3.col`) or by id (`myciel3`).
    pub fn find(&self, name: &str) -> Option<&Path> {
        if let Some(path) = self.by_file_name.get(name) {
            return Some(path);
        }
        INSTANCE_EXTENSIONS
            .iter()
            .find_map(|ext| self.by_file_name.get(&format!("{name}{ext}")))
            .map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.by_file_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_file_name.is_empty()
    }
}

impl FromIterator<PathBuf> for InstanceIndex {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut index = Self::new();
        for path in iter {
            index.insert(path);
        }
        index
    }
}
