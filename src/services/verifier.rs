//! Solution Verifier
//!
//! Checks a proposed partition against an instance's adjacency: every vertex
//! in exactly one class, no two members of a class adjacent. Violations are
//! data, never errors; the caller decides what a rejected solution means.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Adjacency, Graph, Solution};

/// A single way a solution breaks the partition contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A class names a vertex the instance does not have.
    OutOfRange { vertex: usize, class: usize },
    /// Two members of the same class share an edge.
    AdjacentPair { u: usize, v: usize, class: usize },
    /// A vertex already covered by an earlier class (or earlier in the same
    /// class) appears again.
    CoveredTwice { vertex: usize, class: usize },
    /// No class contains the vertex.
    Uncovered { vertex: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { vertex, class } => {
                write!(f, "class {class}: vertex {vertex} out of range")
            }
            Self::AdjacentPair { u, v, class } => {
                write!(f, "class {class}: ({u}, {v}) is an edge of the graph")
            }
            Self::CoveredTwice { vertex, class } => {
                write!(f, "class {class}: vertex {vertex} already covered")
            }
            Self::Uncovered { vertex } => write!(f, "vertex {vertex} not covered"),
        }
    }
}

/// Check `solution` against `adjacency`.
///
/// Violations come in class order, then pair order within a class, with
/// uncovered vertices last in ascending order. An empty result means the
/// solution is accepted.
pub fn verify(adjacency: &Adjacency, solution: &Solution) -> Vec<Violation> {
    let n = adjacency.vertex_count();
    let mut covered = vec![false; n];
    let mut violations = Vec::new();

    for (class, members) in solution.classes().iter().enumerate() {
        let mut in_range = Vec::with_capacity(members.len());
        for &vertex in members {
            match covered.get_mut(vertex) {
                None => violations.push(Violation::OutOfRange { vertex, class }),
                Some(seen) => {
                    if *seen {
                        violations.push(Violation::CoveredTwice { vertex, class });
                    }
                    *seen = true;
                    in_range.push(vertex);
                }
            }
        }

        for (i, &u) in in_range.iter().enumerate() {
            for &v in &in_range[i + 1..] {
                if adjacency.are_adjacent(u, v) {
                    violations.push(Violation::AdjacentPair { u, v, class });
                }
            }
        }
    }

    violations.extend(
        covered
            .iter()
            .enumerate()
            .filter(|(_, seen)| !**seen)
            .map(|(vertex, _)| Violation::Uncovered { vertex }),
    );
    violations
}

/// Verifier with a per-instance adjacency cache.
///
/// Each instance file is parsed and normalized once; later checks against
/// the same path reuse the adjacency. The cache lives as long as the
/// verifier, which is one batch.
#[derive(Debug, Default)]
pub struct SolutionVerifier {
    cache: RwLock<HashMap<PathBuf, Arc<Adjacency>>>,
}

impl SolutionVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjacency for the instance at `path`, loading it on first use.
    pub fn adjacency(&self, path: &Path) -> DomainResult<Arc<Adjacency>> {
        if let Some(adjacency) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(Arc::clone(adjacency));
        }

        let graph = Graph::from_file(path)?;
        debug!(
            path = %path.display(),
            vertices = graph.vertex_count(),
            base = ?graph.base(),
            "loaded instance adjacency"
        );
        let adjacency = Arc::new(graph.adjacency());

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            cache.entry(path.to_path_buf()).or_insert(adjacency),
        ))
    }

    /// Verify a parsed solution against the instance file at `path`.
    #[instrument(skip(self, solution), fields(path = %path.display(), classes = solution.len()))]
    pub fn verify_file(&self, path: &Path, solution: &Solution) -> DomainResult<Vec<Violation>> {
        let adjacency = self.adjacency(path)?;
        Ok(verify(&adjacency, solution))
    }

    /// Parse `text` as a solution and verify it against the instance at `path`.
    pub fn verify_text(&self, path: &Path, text: &str) -> DomainResult<Vec<Violation>> {
        let solution: Solution = text.parse()?;
        self.verify_file(path, &solution)
    }

    /// Number of instances currently cached.
    pub fn cached(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    /// 4-cycle 0-1-2-3-0.
    fn square() -> Adjacency {
        Adjacency::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)])
    }

    fn solution(text: &str) -> Solution {
        text.parse().unwrap()
    }

    #[test]
    fn path_graph_accepts_valid_partition() {
        // Path 0-1-2-3.
        let adj = Adjacency::from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        assert!(verify(&adj, &solution("{0,2} {1} {3}")).is_empty());
    }

    #[test]
    fn path_graph_rejects_adjacent_pair() {
        let adj = Adjacency::from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(
            verify(&adj, &solution("{0,1} {2} {3}")),
            vec![Violation::AdjacentPair { u: 0, v: 1, class: 0 }]
        );
    }

    #[test]
    fn path_graph_reports_uncovered_vertex() {
        let adj = Adjacency::from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(
            verify(&adj, &solution("{0,2} {1}")),
            vec![Violation::Uncovered { vertex: 3 }]
        );
    }

    #[test]
    fn out_of_range_and_double_cover() {
        let v = verify(&square(), &solution("{0, 2} {1, 3} {2} {7}"));
        assert_eq!(
            v,
            vec![
                Violation::CoveredTwice { vertex: 2, class: 2 },
                Violation::OutOfRange { vertex: 7, class: 3 },
            ]
        );
    }

    #[test]
    fn repeated_vertex_is_still_checked_against_its_class() {
        let adj = Adjacency::from_edges(2, &[(0, 1)]);
        assert_eq!(
            verify(&adj, &solution("{0} {0,1}")),
            vec![
                Violation::CoveredTwice { vertex: 0, class: 1 },
                Violation::AdjacentPair { u: 0, v: 1, class: 1 },
            ]
        );
    }

    #[test]
    fn uncovered_listed_ascending_after_class_violations() {
        let v = verify(&square(), &solution("{1, 2}"));
        assert_eq!(
            v,
            vec![
                Violation::AdjacentPair { u: 1, v: 2, class: 0 },
                Violation::Uncovered { vertex: 0 },
                Violation::Uncovered { vertex: 3 },
            ]
        );
    }

    #[test]
    fn singletons_only_mark_coverage() {
        assert!(verify(&square(), &solution("{0} {1} {2} {3}")).is_empty());
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            Violation::AdjacentPair { u: 0, v: 1, class: 2 }.to_string(),
            "class 2: (0, 1) is an edge of the graph"
        );
        assert_eq!(Violation::Uncovered { vertex: 3 }.to_string(), "vertex 3 not covered");
    }

    #[test]
    fn verifier_caches_per_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("path4.col");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "c path\np edge 4 3\ne 1 2\ne 2 3\ne 3 4").unwrap();

        let verifier = SolutionVerifier::new();
        assert!(verifier.verify_text(&path, "{0,2} {1} {3}").unwrap().is_empty());
        assert_eq!(verifier.cached(), 1);

        // Removing the file does not matter once cached.
        std::fs::remove_file(&path).unwrap();
        let v = verifier.verify_text(&path, "{0,1} {2} {3}").unwrap();
        assert_eq!(v, vec![Violation::AdjacentPair { u: 0, v: 1, class: 0 }]);
        assert_eq!(verifier.cached(), 1);
    }

    #[test]
    fn malformed_solution_is_an_error() {
        let verifier = SolutionVerifier::new();
        let err = verifier
            .verify_text(Path::new("/nonexistent.col"), "{0, 1")
            .unwrap_err();
        assert!(matches!(err, crate::domain::DomainError::Solution(_)));
    }
}
