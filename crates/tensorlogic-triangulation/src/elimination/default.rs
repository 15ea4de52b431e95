//! Greedy weighted min-fill elimination.

use super::EliminationSequenceStrategy;
use crate::error::{Result, TriangulationError};
use crate::fill_in::{EliminationScore, FillInTracker};
use crate::graph::{DomainSizes, Edge, EdgeSet, NodeId, UndirectedGraph};

/// Default heuristic used when no order is imposed.
///
/// At each step the node minimising `fill_in_count × clique_weight` is chosen,
/// simplicial nodes first (see [`EliminationScore::rank`]). The strategy
/// removes the node from the working graph itself and records the fill-ins
/// when asked to.
#[derive(Clone, Debug, Default)]
pub struct DefaultEliminationSequenceStrategy {
    tracker: FillInTracker,
    fill_ins: EdgeSet,
    fill_ins_requested: bool,
}

impl DefaultEliminationSequenceStrategy {
    /// Create an unbound strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Score of eliminating `node` now, without eliminating it.
    ///
    /// Computed from `graph` as given, so the caller may edit the graph
    /// between queries.
    pub fn elimination_score(
        &self,
        graph: &UndirectedGraph,
        node: NodeId,
    ) -> Result<EliminationScore> {
        self.tracker.compute_score(graph, node)
    }

    /// `ln(fill_in_count × clique_weight)` of eliminating `node` now.
    pub fn elimination_cost(&self, graph: &UndirectedGraph, node: NodeId) -> Result<f64> {
        Ok(self.elimination_score(graph, node)?.log_cost())
    }

    /// Edges that eliminating `node` now would add.
    pub fn fill_ins_if_eliminated(
        &self,
        graph: &UndirectedGraph,
        node: NodeId,
    ) -> Result<Vec<Edge>> {
        self.tracker.fill_ins_of(graph, node)
    }
}

impl EliminationSequenceStrategy for DefaultEliminationSequenceStrategy {
    fn set_graph(&mut self, graph: &UndirectedGraph, domain_sizes: &DomainSizes) -> bool {
        self.fill_ins.clear();
        self.tracker.set_graph(graph, domain_sizes).is_ok()
    }

    fn next_node_to_eliminate(&mut self, graph: &UndirectedGraph) -> Result<NodeId> {
        if !self.tracker.is_bound() {
            return Err(TriangulationError::NotFound(
                "no graph bound to the default strategy".to_string(),
            ));
        }
        self.tracker
            .best_node(graph, graph.nodes())?
            .ok_or_else(|| TriangulationError::NotFound("no node left to eliminate".to_string()))
    }

    fn elimination_update(&mut self, graph: &mut UndirectedGraph, node: NodeId) -> Result<()> {
        if !graph.exists_node(node) {
            return Err(TriangulationError::OutOfBounds(format!(
                "node {} is not in the working graph",
                node
            )));
        }
        let added = self.tracker.eliminate(graph, node)?;
        if self.fill_ins_requested {
            self.fill_ins.extend(added);
        }
        Ok(())
    }

    fn provides_fill_ins(&self) -> bool {
        true
    }

    fn provides_graph_update(&self) -> bool {
        true
    }

    fn ask_fill_ins(&mut self, do_it: bool) {
        self.fill_ins_requested = do_it;
    }

    fn fill_ins(&self) -> &EdgeSet {
        &self.fill_ins
    }

    fn clear(&mut self) {
        self.tracker.clear();
        self.fill_ins.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn run(
        strategy: &mut DefaultEliminationSequenceStrategy,
        graph: &mut UndirectedGraph,
    ) -> Vec<NodeId> {
        let mut order = Vec::new();
        while !graph.is_empty() {
            let node = strategy.next_node_to_eliminate(graph).unwrap();
            strategy.elimination_update(graph, node).unwrap();
            order.push(node);
        }
        order
    }

    #[test]
    fn test_chain_eliminates_ends_first() {
        let mut graph = UndirectedGraph::from_edges(0..3, &[(0, 1), (1, 2)]).unwrap();
        let sizes: DomainSizes = (0..3).map(|n| (n, 2)).collect();
        let mut strategy = DefaultEliminationSequenceStrategy::new();
        assert!(strategy.set_graph(&graph, &sizes));
        strategy.ask_fill_ins(true);

        let order = run(&mut strategy, &mut graph);
        assert_eq!(order.len(), 3);
        assert_ne!(order[0], 1);
        assert!(strategy.fill_ins().is_empty());
    }

    #[test]
    fn test_cycle_records_one_fill_in() {
        let mut graph =
            UndirectedGraph::from_edges(0..4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let sizes: DomainSizes = (0..4).map(|n| (n, 3)).collect();
        let mut strategy = DefaultEliminationSequenceStrategy::new();
        assert!(strategy.set_graph(&graph, &sizes));
        strategy.ask_fill_ins(true);

        let order = run(&mut strategy, &mut graph);
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(strategy.fill_ins().len(), 1);
        assert!(strategy.fill_ins().contains(&Edge::new(1, 3)));
    }

    #[test]
    fn test_fill_ins_not_recorded_unless_asked() {
        let mut graph =
            UndirectedGraph::from_edges(0..4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let sizes: DomainSizes = (0..4).map(|n| (n, 2)).collect();
        let mut strategy = DefaultEliminationSequenceStrategy::new();
        assert!(strategy.set_graph(&graph, &sizes));
        run(&mut strategy, &mut graph);
        assert!(strategy.fill_ins().is_empty());
    }

    #[test]
    fn test_cost_hooks_do_not_mutate() {
        let graph =
            UndirectedGraph::from_edges(0..4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let sizes: DomainSizes = (0..4).map(|n| (n, 2)).collect();
        let mut strategy = DefaultEliminationSequenceStrategy::new();
        assert!(strategy.set_graph(&graph, &sizes));

        assert_abs_diff_eq!(
            strategy.elimination_cost(&graph, 2).unwrap(),
            8f64.ln(),
            epsilon = 1e-12
        );
        assert_eq!(
            strategy.fill_ins_if_eliminated(&graph, 2).unwrap(),
            vec![Edge::new(1, 3)]
        );
        assert_eq!(graph.size_edges(), 4);
    }

    #[test]
    fn test_cost_hooks_follow_graph_edits() {
        let mut graph =
            UndirectedGraph::from_edges(0..4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let sizes: DomainSizes = (0..4).map(|n| (n, 2)).collect();
        let mut strategy = DefaultEliminationSequenceStrategy::new();
        assert!(strategy.set_graph(&graph, &sizes));
        assert_eq!(strategy.elimination_score(&graph, 0).unwrap().fill_ins, 1);

        // The chord makes 0 simplicial
        graph.add_edge(1, 3).unwrap();
        let score = strategy.elimination_score(&graph, 0).unwrap();
        assert_eq!(score.fill_ins, 0);
        assert!(strategy.fill_ins_if_eliminated(&graph, 0).unwrap().is_empty());
        assert_abs_diff_eq!(
            strategy.elimination_cost(&graph, 0).unwrap(),
            8f64.ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_missing_domain_size_rejects_graph() {
        let mut graph = UndirectedGraph::from_edges(0..2, &[(0, 1)]).unwrap();
        let sizes: DomainSizes = [(0, 2)].into_iter().collect();
        let mut strategy = DefaultEliminationSequenceStrategy::new();
        assert!(!strategy.set_graph(&graph, &sizes));
        assert!(strategy.next_node_to_eliminate(&graph).is_err());
        assert!(strategy.elimination_update(&mut graph, 5).is_err());
    }
}
