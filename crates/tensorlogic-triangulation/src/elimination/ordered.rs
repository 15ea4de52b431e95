//! Elimination following a user-imposed total order.

use tracing::warn;

use super::EliminationSequenceStrategy;
use crate::error::{Result, TriangulationError};
use crate::graph::{DomainSizes, EdgeSet, NodeId, NodeSet, UndirectedGraph};

/// Eliminates the nodes in the exact order supplied by the user.
///
/// The order may mention nodes that are not in the graph; they are skipped.
/// Every node of the graph must appear in the order, otherwise binding fails.
#[derive(Clone, Debug, Default)]
pub struct OrderedEliminationSequenceStrategy {
    order: Option<Vec<NodeId>>,
    /// Nodes of the bound graph at binding time
    graph_nodes: Option<NodeSet>,
    /// Position of the next node to eliminate in `order`
    index: usize,
    order_compatible: bool,
    /// Always empty: the driver computes fill-ins for this strategy
    no_fill_ins: EdgeSet,
}

impl OrderedEliminationSequenceStrategy {
    /// Create a strategy with no order yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a strategy eliminating the nodes in `order`.
    pub fn with_order(order: Vec<NodeId>) -> Self {
        Self {
            order: Some(order),
            ..Self::default()
        }
    }

    /// Replace the order.
    ///
    /// Returns whether the new order covers the bound graph (`true` when no
    /// graph is bound). The position is reset to the start of the order.
    pub fn set_order(&mut self, order: Vec<NodeId>) -> bool {
        self.order = Some(order);
        match self.graph_nodes.take() {
            Some(nodes) => {
                let compatible = self.bind(&nodes);
                self.graph_nodes = Some(nodes);
                compatible
            }
            None => true,
        }
    }

    /// The imposed order, if any.
    pub fn order(&self) -> Option<&[NodeId]> {
        self.order.as_deref()
    }

    /// Check coverage of `nodes` and move to the first order position in `nodes`.
    fn bind(&mut self, nodes: &NodeSet) -> bool {
        self.index = 0;
        self.order_compatible = false;
        let Some(order) = &self.order else {
            return false;
        };

        let covered: NodeSet = order
            .iter()
            .copied()
            .filter(|node| nodes.contains(node))
            .collect();
        if covered.len() != nodes.len() {
            warn!(
                graph_nodes = nodes.len(),
                covered = covered.len(),
                "elimination order does not cover the graph"
            );
            return false;
        }

        self.index = order
            .iter()
            .position(|node| nodes.contains(node))
            .unwrap_or(order.len());
        self.order_compatible = true;
        true
    }
}

impl EliminationSequenceStrategy for OrderedEliminationSequenceStrategy {
    fn set_graph(&mut self, graph: &UndirectedGraph, _domain_sizes: &DomainSizes) -> bool {
        let nodes = graph.node_set();
        let compatible = self.bind(&nodes);
        self.graph_nodes = Some(nodes);
        compatible
    }

    fn next_node_to_eliminate(&mut self, graph: &UndirectedGraph) -> Result<NodeId> {
        if self.graph_nodes.is_none() {
            return Err(TriangulationError::NotFound(
                "no graph bound to the ordered strategy".to_string(),
            ));
        }
        if !self.order_compatible {
            return Err(TriangulationError::NotFound(
                "elimination order does not match the graph".to_string(),
            ));
        }
        if graph.is_empty() {
            return Err(TriangulationError::NotFound(
                "no node left to eliminate".to_string(),
            ));
        }
        self.order
            .as_ref()
            .and_then(|order| order.get(self.index))
            .copied()
            .ok_or_else(|| TriangulationError::NotFound("elimination order exhausted".to_string()))
    }

    fn elimination_update(&mut self, graph: &mut UndirectedGraph, node: NodeId) -> Result<()> {
        let Some(order) = &self.order else {
            return Err(TriangulationError::OutOfBounds(
                "no elimination order set".to_string(),
            ));
        };
        match order.get(self.index) {
            Some(&expected) if expected == node => {}
            expected => {
                return Err(TriangulationError::OutOfBounds(format!(
                    "eliminated node {} but the order expected {:?}",
                    node, expected
                )))
            }
        }

        self.index += 1;
        while self.index < order.len() && !graph.exists_node(order[self.index]) {
            self.index += 1;
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
        self.index = 0;
        self.order_compatible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> (UndirectedGraph, DomainSizes) {
        let graph = UndirectedGraph::from_edges(0..3, &[(0, 1), (1, 2)]).unwrap();
        (graph, (0..3).map(|n| (n, 2)).collect())
    }

    #[test]
    fn test_unbound_strategy_has_no_node() {
        let (graph, _) = path();
        let mut strategy = OrderedEliminationSequenceStrategy::with_order(vec![0, 1, 2]);
        assert!(matches!(
            strategy.next_node_to_eliminate(&graph),
            Err(TriangulationError::NotFound(_))
        ));
    }

    #[test]
    fn test_incomplete_order_is_rejected() {
        let (graph, sizes) = path();
        let mut strategy = OrderedEliminationSequenceStrategy::with_order(vec![0, 2]);
        assert!(!strategy.set_graph(&graph, &sizes));
        assert!(strategy.next_node_to_eliminate(&graph).is_err());

        assert!(strategy.set_order(vec![2, 0, 1]));
        assert_eq!(strategy.next_node_to_eliminate(&graph).unwrap(), 2);
    }

    #[test]
    fn test_follows_order_and_skips_foreign_nodes() {
        let (mut graph, sizes) = path();
        let mut strategy = OrderedEliminationSequenceStrategy::with_order(vec![9, 1, 7, 0, 2]);
        assert!(strategy.set_graph(&graph, &sizes));

        let mut eliminated = Vec::new();
        while !graph.is_empty() {
            let node = strategy.next_node_to_eliminate(&graph).unwrap();
            graph.eliminate_node(node).unwrap();
            strategy.elimination_update(&mut graph, node).unwrap();
            eliminated.push(node);
        }
        assert_eq!(eliminated, vec![1, 0, 2]);
        assert!(strategy.next_node_to_eliminate(&graph).is_err());
    }

    #[test]
    fn test_out_of_order_update_fails() {
        let (mut graph, sizes) = path();
        let mut strategy = OrderedEliminationSequenceStrategy::with_order(vec![0, 1, 2]);
        assert!(strategy.set_graph(&graph, &sizes));
        graph.eliminate_node(2).unwrap();
        assert!(matches!(
            strategy.elimination_update(&mut graph, 2),
            Err(TriangulationError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_capabilities() {
        let strategy = OrderedEliminationSequenceStrategy::new();
        assert!(!strategy.provides_fill_ins());
        assert!(!strategy.provides_graph_update());
        assert!(strategy.fill_ins().is_empty());
    }
}
