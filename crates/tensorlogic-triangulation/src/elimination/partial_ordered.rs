//! Elimination constrained by a partial order.
//!
//! The partial order is a sequence of node subsets `S1, S2, ..., Sk`: every node
//! of `Si` is eliminated before any node of `Sj` for `i < j`. Inside a subset
//! the weighted min-fill heuristic picks the order. A node listed in several
//! subsets belongs to the first one.

use tracing::warn;

use super::EliminationSequenceStrategy;
use crate::error::{Result, TriangulationError};
use crate::fill_in::FillInTracker;
use crate::graph::{DomainSizes, EdgeSet, NodeId, NodeSet, UndirectedGraph};

/// Eliminates ordered subsets of nodes, heuristically inside each subset.
#[derive(Clone, Debug, Default)]
pub struct PartialOrderedEliminationSequenceStrategy {
    /// Disjoint subsets, each node kept in the first subset listing it
    subsets: Option<Vec<NodeSet>>,
    /// Nodes of the bound graph at binding time
    graph_nodes: Option<NodeSet>,
    /// Index of the subset the eligible nodes come from
    subset_index: usize,
    /// Nodes that may be eliminated now
    nodeset: NodeSet,
    partial_order_compatible: bool,
    tracker: FillInTracker,
    /// Always empty: the driver computes fill-ins for this strategy
    no_fill_ins: EdgeSet,
}

impl PartialOrderedEliminationSequenceStrategy {
    /// Create a strategy with no partial order yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a strategy constrained by `subsets`.
    pub fn with_partial_order(subsets: Vec<NodeSet>) -> Self {
        Self {
            subsets: Some(disjoint_subsets(subsets)),
            ..Self::default()
        }
    }

    /// Replace the partial order.
    ///
    /// Returns whether the new partial order covers the bound graph (`true`
    /// when no graph is bound). Elimination restarts from the first subset.
    pub fn set_partial_order(&mut self, subsets: Vec<NodeSet>) -> bool {
        self.subsets = Some(disjoint_subsets(subsets));
        match self.graph_nodes.take() {
            Some(nodes) => {
                let compatible = self.bind(&nodes);
                self.graph_nodes = Some(nodes);
                compatible
            }
            None => true,
        }
    }

    /// The imposed partial order, if any.
    pub fn partial_order(&self) -> Option<&[NodeSet]> {
        self.subsets.as_deref()
    }

    /// Nodes that may currently be eliminated.
    pub fn eligible_nodes(&self) -> &NodeSet {
        &self.nodeset
    }

    fn bind(&mut self, nodes: &NodeSet) -> bool {
        self.subset_index = 0;
        self.nodeset.clear();
        self.partial_order_compatible = false;
        let Some(subsets) = &self.subsets else {
            return false;
        };

        let covered = subsets
            .iter()
            .map(|subset| subset.intersection(nodes).count())
            .sum::<usize>();
        if covered != nodes.len() {
            warn!(
                graph_nodes = nodes.len(),
                covered, "partial order does not cover the graph"
            );
            return false;
        }

        self.partial_order_compatible = true;
        self.advance(|node| nodes.contains(&node));
        true
    }

    /// Move to the first subset, from `subset_index` on, with a node satisfying
    /// `present`, and make its present nodes eligible.
    fn advance(&mut self, present: impl Fn(NodeId) -> bool) {
        let Some(subsets) = &self.subsets else {
            return;
        };
        while self.subset_index < subsets.len() {
            let eligible: NodeSet = subsets[self.subset_index]
                .iter()
                .copied()
                .filter(|&node| present(node))
                .collect();
            if !eligible.is_empty() {
                self.nodeset = eligible;
                return;
            }
            self.subset_index += 1;
        }
    }
}

/// Keep every node only in the first subset that lists it.
fn disjoint_subsets(subsets: Vec<NodeSet>) -> Vec<NodeSet> {
    let mut seen = NodeSet::new();
    subsets
        .into_iter()
        .map(|subset| {
            let own: NodeSet = subset.difference(&seen).copied().collect();
            seen.extend(own.iter().copied());
            own
        })
        .collect()
}

impl EliminationSequenceStrategy for PartialOrderedEliminationSequenceStrategy {
    fn set_graph(&mut self, graph: &UndirectedGraph, domain_sizes: &DomainSizes) -> bool {
        if self.tracker.set_graph(graph, domain_sizes).is_err() {
            self.clear();
            return false;
        }
        let nodes = graph.node_set();
        let compatible = self.bind(&nodes);
        self.graph_nodes = Some(nodes);
        compatible
    }

    fn next_node_to_eliminate(&mut self, graph: &UndirectedGraph) -> Result<NodeId> {
        if self.graph_nodes.is_none() {
            return Err(TriangulationError::NotFound(
                "no graph bound to the partial ordered strategy".to_string(),
            ));
        }
        if !self.partial_order_compatible {
            return Err(TriangulationError::NotFound(
                "partial order does not match the graph".to_string(),
            ));
        }
        if graph.is_empty() {
            return Err(TriangulationError::NotFound(
                "no node left to eliminate".to_string(),
            ));
        }
        self.tracker
            .best_node(graph, self.nodeset.iter().copied())?
            .ok_or_else(|| TriangulationError::NotFound("partial order exhausted".to_string()))
    }

    fn elimination_update(&mut self, graph: &mut UndirectedGraph, node: NodeId) -> Result<()> {
        if !self.nodeset.remove(&node) {
            return Err(TriangulationError::OutOfBounds(format!(
                "node {} is not eligible for elimination in subset {}",
                node, self.subset_index
            )));
        }
        // The driver updated the graph itself, so no cached score can be trusted
        self.tracker.invalidate_all();

        if self.nodeset.is_empty() {
            self.subset_index += 1;
            let remaining: &UndirectedGraph = graph;
            self.advance(|n| remaining.exists_node(n));
        }
        Ok(())
    }

    fn provides_fill_ins(&self) -> bool {
        false
    }

    fn provides_graph_update(&self) -> bool {
        false
    }

    fn ask_fill_ins(&mut self, _do_it: bool) {}

    fn fill_ins(&self) -> &EdgeSet {
        &self.no_fill_ins
    }

    fn clear(&mut self) {
        self.graph_nodes = None;
        self.subset_index = 0;
        self.nodeset.clear();
        self.partial_order_compatible = false;
        self.tracker.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(nodes: &[NodeId]) -> NodeSet {
        nodes.iter().copied().collect()
    }

    fn run(
        strategy: &mut PartialOrderedEliminationSequenceStrategy,
        mut graph: UndirectedGraph,
    ) -> Vec<NodeId> {
        let mut eliminated = Vec::new();
        while !graph.is_empty() {
            let node = strategy.next_node_to_eliminate(&graph).unwrap();
            graph.eliminate_node(node).unwrap();
            strategy.elimination_update(&mut graph, node).unwrap();
            eliminated.push(node);
        }
        eliminated
    }

    #[test]
    fn test_subsets_are_respected() {
        // Star centred on 0: the heuristic alone would eliminate 0 last
        let graph =
            UndirectedGraph::from_edges(0..4, &[(0, 1), (0, 2), (0, 3)]).unwrap();
        let sizes: DomainSizes = (0..4).map(|n| (n, 2)).collect();
        let mut strategy = PartialOrderedEliminationSequenceStrategy::with_partial_order(vec![
            set(&[0, 1]),
            set(&[2, 3]),
        ]);
        assert!(strategy.set_graph(&graph, &sizes));
        assert_eq!(strategy.eligible_nodes(), &set(&[0, 1]));

        let order = run(&mut strategy, graph);
        assert_eq!(order.len(), 4);
        assert!(order[..2].contains(&0));
        assert!(order[..2].contains(&1));
    }

    #[test]
    fn test_overlapping_subsets_keep_first_occurrence() {
        let strategy = PartialOrderedEliminationSequenceStrategy::with_partial_order(vec![
            set(&[0, 1]),
            set(&[1, 2]),
        ]);
        assert_eq!(
            strategy.partial_order().unwrap(),
            &[set(&[0, 1]), set(&[2])]
        );
    }

    #[test]
    fn test_uncovered_graph_is_rejected() {
        let graph = UndirectedGraph::from_edges(0..3, &[(0, 1)]).unwrap();
        let sizes: DomainSizes = (0..3).map(|n| (n, 2)).collect();
        let mut strategy =
            PartialOrderedEliminationSequenceStrategy::with_partial_order(vec![set(&[0, 1])]);
        assert!(!strategy.set_graph(&graph, &sizes));
        assert!(matches!(
            strategy.next_node_to_eliminate(&graph),
            Err(TriangulationError::NotFound(_))
        ));

        assert!(strategy.set_partial_order(vec![set(&[2]), set(&[0, 1, 5])]));
        assert_eq!(strategy.next_node_to_eliminate(&graph).unwrap(), 2);
    }

    #[test]
    fn test_empty_subsets_are_skipped() {
        let graph = UndirectedGraph::from_edges(0..2, &[(0, 1)]).unwrap();
        let sizes: DomainSizes = (0..2).map(|n| (n, 2)).collect();
        let mut strategy = PartialOrderedEliminationSequenceStrategy::with_partial_order(vec![
            set(&[7]),
            set(&[1]),
            set(&[]),
            set(&[0]),
        ]);
        assert!(strategy.set_graph(&graph, &sizes));
        assert_eq!(run(&mut strategy, graph), vec![1, 0]);
    }

    #[test]
    fn test_ineligible_update_fails() {
        let mut graph = UndirectedGraph::from_edges(0..2, &[(0, 1)]).unwrap();
        let sizes: DomainSizes = (0..2).map(|n| (n, 2)).collect();
        let mut strategy = PartialOrderedEliminationSequenceStrategy::with_partial_order(vec![
            set(&[0]),
            set(&[1]),
        ]);
        assert!(strategy.set_graph(&graph, &sizes));
        graph.eliminate_node(1).unwrap();
        assert!(matches!(
            strategy.elimination_update(&mut graph, 1),
            Err(TriangulationError::OutOfBounds(_))
        ));
    }
}
