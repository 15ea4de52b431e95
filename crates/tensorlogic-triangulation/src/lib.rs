//! Graph triangulation and junction tree construction for exact inference.
//!
//! This crate turns an undirected graph (typically the moral graph of a
//! Bayesian network) annotated with per-node domain sizes into a chordal
//! supergraph, an elimination order and a junction tree whose cliques are the
//! maximal cliques of the triangulated graph.
//!
//! # Core Concepts
//!
//! - **Elimination sequence strategies**: decide which node is eliminated next
//!   (min-fill heuristic, imposed total order, imposed partial order)
//! - **Static triangulation**: runs the elimination on a copy of the graph and
//!   memoizes every derived structure
//! - **Junction tree strategies**: assemble the clique tree from the eliminated
//!   cliques
//!
//! # Architecture
//!
//! ```text
//! UndirectedGraph ─→ EliminationSequenceStrategy ─→ EliminationRecord ─→ JunctionTreeStrategy
//!       ↓                      ↓                           ↓                     ↓
//!  domain sizes          node to eliminate         cliques + fill-ins      CliqueGraph
//! ```
//!
//! # Example
//!
//! ```
//! use tensorlogic_triangulation::{DefaultTriangulation, DomainSizes, Triangulation, UndirectedGraph};
//!
//! let graph = UndirectedGraph::from_edges(0..4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
//! let sizes: DomainSizes = graph.nodes().map(|n| (n, 2)).collect();
//! let mut triangulation =
//!     DefaultTriangulation::with_graph(&graph, &sizes, Default::default()).unwrap();
//!
//! assert!(triangulation.triangulated_graph().unwrap().is_chordal());
//! assert_eq!(triangulation.junction_tree().unwrap().size(), 2);
//! ```

mod clique_graph;
mod config;
pub mod elimination;
mod error;
mod fill_in;
mod graph;
pub mod junction_tree;
mod record;
mod static_triangulation;
mod triangulation;

pub use clique_graph::{CliqueGraph, CliqueId};
pub use config::TriangulationConfig;
pub use elimination::{
    DefaultEliminationSequenceStrategy, EliminationSequenceStrategy,
    OrderedEliminationSequenceStrategy, PartialOrderedEliminationSequenceStrategy,
};
pub use error::{Result, TriangulationError};
pub use fill_in::{EliminationScore, FillInTracker};
pub use graph::{
    check_domain_sizes, log10_domain_size, log_domain_size, DomainSizes, Edge, EdgeSet, NodeId,
    NodeSet, UndirectedGraph,
};
pub use junction_tree::{
    DefaultJunctionTreeStrategy, JunctionTreeStrategy, SpanningJunctionTreeStrategy,
};
pub use record::EliminationRecord;
pub use static_triangulation::StaticTriangulation;
pub use triangulation::{
    DefaultTriangulation, OrderedTriangulation, PartialOrderedTriangulation, Triangulation,
};

/// Build the junction tree of `graph` with the default strategies.
///
/// Shorthand for binding a [`DefaultTriangulation`] and reading its tree once.
pub fn build_junction_tree(
    graph: &UndirectedGraph,
    domain_sizes: &DomainSizes,
) -> Result<CliqueGraph> {
    let mut triangulation =
        DefaultTriangulation::with_graph(graph, domain_sizes, TriangulationConfig::default())?;
    triangulation.junction_tree().cloned()
}

/// Check whether `tree` is a valid junction tree for the triangulation of
/// `original`: a forest with the running intersection property whose cliques
/// cover every edge of `original`.
pub fn is_junction_tree_of(tree: &CliqueGraph, original: &UndirectedGraph) -> bool {
    tree.is_forest()
        && tree.verify_running_intersection_property()
        && original.edges().all(|edge| {
            tree.cliques()
                .any(|(_, clique)| clique.contains(&edge.first()) && clique.contains(&edge.second()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moral_w() -> UndirectedGraph {
        UndirectedGraph::from_edges(1..=5, &[(1, 3), (1, 4), (3, 5), (4, 5), (2, 4), (2, 5)])
            .unwrap()
    }

    #[test]
    fn test_build_junction_tree() {
        let graph = moral_w();
        let sizes: DomainSizes = graph.nodes().map(|n| (n, 2)).collect();
        let tree = build_junction_tree(&graph, &sizes).unwrap();
        assert!(is_junction_tree_of(&tree, &graph));
        assert_eq!(tree.variables(), graph.node_set());
    }

    #[test]
    fn test_build_junction_tree_requires_domain_sizes() {
        let graph = moral_w();
        assert!(matches!(
            build_junction_tree(&graph, &DomainSizes::new()),
            Err(TriangulationError::MissingDomainSize { node: 1 })
        ));
    }

    #[test]
    fn test_is_junction_tree_of_rejects_uncovered_edge() {
        let graph = UndirectedGraph::from_edges(0..3, &[(0, 1), (1, 2)]).unwrap();
        let mut tree = CliqueGraph::new();
        tree.add_clique_with_id(0, NodeSet::from([0, 1])).unwrap();
        tree.add_clique_with_id(2, NodeSet::from([2])).unwrap();
        assert!(!is_junction_tree_of(&tree, &graph));
    }
}
