//! Outcome of one elimination pass.
//!
//! An [`EliminationRecord`] is immutable once built. It holds the elimination
//! order, the clique created by each eliminated node (the node together with
//! its neighbours at the time of its elimination), the triangulated graph and
//! the elimination tree. Junction tree strategies read it through an `Rc`.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::clique_graph::CliqueGraph;
use crate::error::{Result, TriangulationError};
use crate::graph::{EdgeSet, NodeId, NodeSet, UndirectedGraph};

/// Elimination order, eliminated cliques, triangulated graph and elimination tree.
#[derive(Clone, Debug, PartialEq)]
pub struct EliminationRecord {
    triangulated: UndirectedGraph,
    order: Vec<NodeId>,
    positions: HashMap<NodeId, usize>,
    eliminated_cliques: BTreeMap<NodeId, NodeSet>,
    elimination_tree: CliqueGraph,
    fill_ins: EdgeSet,
}

impl EliminationRecord {
    /// Assemble the record of an elimination of `original`.
    ///
    /// `order` must be a permutation of the nodes of `original` and
    /// `eliminated_cliques` must hold one clique per eliminated node.
    pub fn new(
        original: &UndirectedGraph,
        order: Vec<NodeId>,
        eliminated_cliques: BTreeMap<NodeId, NodeSet>,
        fill_ins: EdgeSet,
    ) -> Result<Self> {
        let mut positions = HashMap::with_capacity(order.len());
        for (pos, &node) in order.iter().enumerate() {
            if !original.exists_node(node) {
                return Err(TriangulationError::UndefinedElement(format!(
                    "eliminated node {} is not in the graph",
                    node
                )));
            }
            if positions.insert(node, pos).is_some() {
                return Err(TriangulationError::OperationNotAllowed(format!(
                    "node {} eliminated twice",
                    node
                )));
            }
        }
        if order.len() != original.size() || eliminated_cliques.len() != order.len() {
            return Err(TriangulationError::UndefinedElement(format!(
                "elimination covers {} of {} nodes with {} cliques",
                order.len(),
                original.size(),
                eliminated_cliques.len()
            )));
        }

        // Every edge of the triangulated graph lies in some eliminated clique
        let mut triangulated = original.clone();
        for clique in eliminated_cliques.values() {
            triangulated.connect_all_raw(clique);
        }

        let elimination_tree =
            Self::build_elimination_tree(&order, &positions, &eliminated_cliques)?;

        Ok(Self {
            triangulated,
            order,
            positions,
            eliminated_cliques,
            elimination_tree,
            fill_ins,
        })
    }

    /// Replay the elimination of `graph` in the given order.
    ///
    /// Fill-ins are recorded.
    pub fn from_order(graph: &UndirectedGraph, order: Vec<NodeId>) -> Result<Self> {
        let mut working = graph.clone();
        let mut cliques = BTreeMap::new();
        let mut fill_ins = EdgeSet::new();

        for &node in &order {
            let mut clique = working.neighbours(node)?.clone();
            clique.insert(node);
            fill_ins.extend(working.eliminate_node(node)?);
            cliques.insert(node, clique);
        }

        Self::new(graph, order, cliques, fill_ins)
    }

    /// Each clique is linked to the clique of its earliest eliminated later node.
    fn build_elimination_tree(
        order: &[NodeId],
        positions: &HashMap<NodeId, usize>,
        cliques: &BTreeMap<NodeId, NodeSet>,
    ) -> Result<CliqueGraph> {
        let mut tree = CliqueGraph::new();
        for &node in order {
            let clique = cliques.get(&node).ok_or_else(|| {
                TriangulationError::UndefinedElement(format!("no clique for node {}", node))
            })?;
            tree.add_clique_with_id(node, clique.clone())?;
        }

        for &node in order {
            let parent = cliques[&node]
                .iter()
                .copied()
                .filter(|&n| n != node)
                .min_by_key(|n| positions.get(n).copied().unwrap_or(usize::MAX));
            if let Some(parent) = parent {
                tree.add_edge(node, parent)?;
            }
        }
        Ok(tree)
    }

    /// The triangulated graph: the original graph plus the fill-ins.
    pub fn triangulated_graph(&self) -> &UndirectedGraph {
        &self.triangulated
    }

    /// Nodes in elimination order.
    pub fn elimination_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Position of `node` in the elimination order.
    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.positions.get(&node).copied()
    }

    /// Clique created by the elimination of `node`.
    pub fn eliminated_clique(&self, node: NodeId) -> Option<&NodeSet> {
        self.eliminated_cliques.get(&node)
    }

    /// Clique created by each eliminated node.
    pub fn eliminated_cliques(&self) -> &BTreeMap<NodeId, NodeSet> {
        &self.eliminated_cliques
    }

    /// The elimination tree; clique identifiers are the eliminated nodes.
    pub fn elimination_tree(&self) -> &CliqueGraph {
        &self.elimination_tree
    }

    /// Fill-in edges (empty unless they were requested).
    pub fn fill_ins(&self) -> &EdgeSet {
        &self.fill_ins
    }

    /// Minimal triangulation obtained by recursive thinning of the fill-ins.
    ///
    /// A fill-in `u ~ v` can be removed without breaking chordality when the
    /// common neighbours of `u` and `v` form a clique; removals are repeated
    /// until none applies. The current order is kept when it is still a perfect
    /// elimination order of the thinned graph, otherwise a new one is derived
    /// by maximum cardinality search.
    pub fn thinned(&self, original: &UndirectedGraph, keep_fill_ins: bool) -> Result<Self> {
        let mut graph = self.triangulated.clone();
        let mut candidates: EdgeSet = graph
            .edges()
            .filter(|edge| !original.exists_edge(edge.first(), edge.second()))
            .collect();
        let initial = candidates.len();

        // Removing one edge can make another candidate non-removable, so the
        // candidates are re-examined after every removal
        while let Some(edge) = candidates
            .iter()
            .copied()
            .find(|edge| Self::is_removable(&graph, edge.first(), edge.second()))
        {
            graph.erase_edge_raw(edge.first(), edge.second());
            candidates.remove(&edge);
        }

        debug!(
            fill_ins = initial,
            removed = initial - candidates.len(),
            "recursive thinning done"
        );

        let order = if graph.is_perfect_elimination_order(&self.order) {
            self.order.clone()
        } else {
            let replacement = graph.max_cardinality_search();
            warn!(
                nodes = replacement.len(),
                "elimination order is no longer perfect after thinning, replaced by maximum cardinality search"
            );
            replacement
        };

        let mut record = Self::from_order(&graph, order)?;
        record.fill_ins = if keep_fill_ins { candidates } else { EdgeSet::new() };
        Ok(record)
    }

    /// `u ~ v` can leave a chordal graph when it belongs to a single maximal
    /// clique, i.e. when the common neighbours of `u` and `v` are pairwise adjacent.
    fn is_removable(graph: &UndirectedGraph, u: NodeId, v: NodeId) -> bool {
        match (graph.neighbours(u), graph.neighbours(v)) {
            (Ok(a), Ok(b)) => graph.is_clique(&a.intersection(b).copied().collect()),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;

    fn set(nodes: &[NodeId]) -> NodeSet {
        nodes.iter().copied().collect()
    }

    fn square() -> UndirectedGraph {
        UndirectedGraph::from_edges(0..4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap()
    }

    #[test]
    fn test_from_order() {
        let record = EliminationRecord::from_order(&square(), vec![0, 1, 2, 3]).unwrap();
        assert_eq!(record.elimination_order(), &[0, 1, 2, 3]);
        assert_eq!(record.position(2), Some(2));
        assert_eq!(record.eliminated_clique(0).unwrap(), &set(&[0, 1, 3]));
        assert_eq!(record.eliminated_clique(1).unwrap(), &set(&[1, 2, 3]));
        assert_eq!(record.eliminated_clique(3).unwrap(), &set(&[3]));
        assert_eq!(record.fill_ins(), &EdgeSet::from([Edge::new(1, 3)]));
        assert!(record.triangulated_graph().is_chordal());
        assert_eq!(record.triangulated_graph().size_edges(), 5);
    }

    #[test]
    fn test_elimination_tree_links_to_next_neighbour() {
        let record = EliminationRecord::from_order(&square(), vec![0, 1, 2, 3]).unwrap();
        let tree = record.elimination_tree();
        assert_eq!(tree.size(), 4);
        assert!(tree.exists_edge(0, 1));
        assert!(tree.exists_edge(1, 2));
        assert!(tree.exists_edge(2, 3));
        assert!(tree.is_forest());
        assert!(tree.verify_running_intersection_property());
    }

    #[test]
    fn test_invalid_order_is_rejected() {
        assert!(EliminationRecord::from_order(&square(), vec![0, 1, 2]).is_err());
        assert!(EliminationRecord::from_order(&square(), vec![0, 1, 2, 3, 9]).is_err());
    }

    #[test]
    fn test_thinning_removes_redundant_fill_ins() {
        // Path 0-1-2: eliminating 1 first adds 0~2, which is not needed
        let path = UndirectedGraph::from_edges(0..3, &[(0, 1), (1, 2)]).unwrap();
        let record = EliminationRecord::from_order(&path, vec![1, 0, 2]).unwrap();
        assert_eq!(record.fill_ins().len(), 1);

        let thinned = record.thinned(&path, true).unwrap();
        assert!(thinned.fill_ins().is_empty());
        assert_eq!(thinned.triangulated_graph(), &path);
        assert!(thinned.triangulated_graph().is_chordal());
        assert_ne!(thinned.elimination_order()[0], 1);
    }

    #[test]
    fn test_thinning_keeps_needed_fill_ins() {
        let record = EliminationRecord::from_order(&square(), vec![0, 1, 2, 3]).unwrap();
        let thinned = record.thinned(&square(), true).unwrap();
        assert_eq!(thinned.fill_ins(), record.fill_ins());
        assert_eq!(thinned.elimination_order(), record.elimination_order());
    }
}
