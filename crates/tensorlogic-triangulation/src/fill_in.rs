//! Fill-in bookkeeping for greedy elimination heuristics.
//!
//! Eliminating a node connects all of its neighbours; the edges that did not
//! exist before are the *fill-ins*. The [`FillInTracker`] answers "what would
//! eliminating this node cost right now" without touching the graph, and keeps
//! a cache of those answers that is invalidated locally when a node is actually
//! eliminated through it.
//!
//! The cost of eliminating `v` is `fill_in_count(v) × weight(v)` where
//! `weight(v)` is the product of the domain sizes of `v` and its neighbours.
//! Weights are handled as natural logarithms so large cliques cannot overflow.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Result, TriangulationError};
use crate::graph::{check_domain_sizes, DomainSizes, Edge, NodeId, NodeSet, UndirectedGraph};

/// Cost of eliminating one node in the current state of the graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EliminationScore {
    /// Candidate node
    pub node: NodeId,
    /// Number of edges the elimination would add
    pub fill_ins: usize,
    /// `ln` of the domain size product of the node and its neighbours
    pub log_weight: f64,
}

impl EliminationScore {
    /// A node is simplicial when its neighbours already form a clique.
    pub fn is_simplicial(&self) -> bool {
        self.fill_ins == 0
    }

    /// `ln(fill_ins × weight)`, or `ln(weight)` for simplicial nodes.
    pub fn log_cost(&self) -> f64 {
        if self.is_simplicial() {
            self.log_weight
        } else {
            (self.fill_ins as f64).ln() + self.log_weight
        }
    }

    /// Heuristic ranking: simplicial nodes first, then cheapest, then lightest
    /// clique, then smallest identifier.
    pub fn rank(&self, other: &Self) -> Ordering {
        (!self.is_simplicial())
            .cmp(&!other.is_simplicial())
            .then_with(|| self.log_cost().total_cmp(&other.log_cost()))
            .then_with(|| self.log_weight.total_cmp(&other.log_weight))
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Tracks fill-in costs of candidate eliminations.
#[derive(Clone, Debug, Default)]
pub struct FillInTracker {
    /// `ln` of the domain size of each bound node
    log_domain: HashMap<NodeId, f64>,
    /// Cached scores, valid for the current state of the graph
    scores: HashMap<NodeId, EliminationScore>,
    bound: bool,
}

impl FillInTracker {
    /// Create an unbound tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the tracker to a graph and its domain sizes.
    pub fn set_graph(&mut self, graph: &UndirectedGraph, domain_sizes: &DomainSizes) -> Result<()> {
        self.clear();
        check_domain_sizes(graph, domain_sizes)?;
        self.log_domain = graph
            .nodes()
            .map(|node| (node, (domain_sizes[&node] as f64).ln()))
            .collect();
        self.bound = true;
        Ok(())
    }

    /// Whether a graph is bound.
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Drop the binding and every cached score.
    pub fn clear(&mut self) {
        self.log_domain.clear();
        self.scores.clear();
        self.bound = false;
    }

    /// Edges that eliminating `node` now would add.
    pub fn fill_ins_of(&self, graph: &UndirectedGraph, node: NodeId) -> Result<Vec<Edge>> {
        graph.fill_ins_of(node)
    }

    /// Score of eliminating `node` now (cached).
    ///
    /// The cache only follows changes made through [`eliminate`](Self::eliminate).
    pub fn score(&mut self, graph: &UndirectedGraph, node: NodeId) -> Result<EliminationScore> {
        if let Some(score) = self.scores.get(&node) {
            return Ok(*score);
        }
        let score = self.compute_score(graph, node)?;
        self.scores.insert(node, score);
        Ok(score)
    }

    /// Score of eliminating `node` now, ignoring the cache.
    pub fn compute_score(&self, graph: &UndirectedGraph, node: NodeId) -> Result<EliminationScore> {
        if !self.bound {
            return Err(TriangulationError::UndefinedElement(
                "fill-in tracker is not bound to a graph".to_string(),
            ));
        }
        let neighbours = graph.neighbours(node)?;
        let log_weight = std::iter::once(&node)
            .chain(neighbours.iter())
            .try_fold(0.0, |acc, n| {
                self.log_domain
                    .get(n)
                    .map(|log| acc + log)
                    .ok_or(TriangulationError::MissingDomainSize { node: *n })
            })?;

        Ok(EliminationScore {
            node,
            fill_ins: graph.missing_edges_among(neighbours).len(),
            log_weight,
        })
    }

    /// Best candidate according to [`EliminationScore::rank`], using the cache.
    pub fn best_node(
        &mut self,
        graph: &UndirectedGraph,
        candidates: impl IntoIterator<Item = NodeId>,
    ) -> Result<Option<NodeId>> {
        let mut best: Option<EliminationScore> = None;
        for node in candidates {
            let score = self.score(graph, node)?;
            if best.map_or(true, |b| score.rank(&b) == Ordering::Less) {
                best = Some(score);
            }
        }
        Ok(best.map(|score| score.node))
    }

    /// Eliminate `node` from `graph` and invalidate the scores it affects.
    ///
    /// Returns the fill-in edges that were added.
    pub fn eliminate(&mut self, graph: &mut UndirectedGraph, node: NodeId) -> Result<Vec<Edge>> {
        let neighbours = graph.neighbours(node)?.clone();
        self.invalidate_around(graph, &neighbours);
        self.scores.remove(&node);
        graph.eliminate_node(node)
    }

    /// Forget every cached score.
    pub fn invalidate_all(&mut self) {
        self.scores.clear();
    }

    /// Connecting `nodes` changes the neighbourhood of each of them and the
    /// edges among the neighbours of anything adjacent to them.
    fn invalidate_around(&mut self, graph: &UndirectedGraph, nodes: &NodeSet) {
        for node in nodes {
            self.scores.remove(node);
            if let Ok(adjacent) = graph.neighbours(*node) {
                for n in adjacent {
                    self.scores.remove(n);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square() -> (UndirectedGraph, DomainSizes) {
        let graph =
            UndirectedGraph::from_edges(0..4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let sizes = (0..4).map(|n| (n, 2)).collect();
        (graph, sizes)
    }

    #[test]
    fn test_unbound_tracker_fails() {
        let (graph, _) = square();
        let tracker = FillInTracker::new();
        assert!(matches!(
            tracker.compute_score(&graph, 0),
            Err(TriangulationError::UndefinedElement(_))
        ));
    }

    #[test]
    fn test_score_of_square() {
        let (graph, sizes) = square();
        let mut tracker = FillInTracker::new();
        tracker.set_graph(&graph, &sizes).unwrap();

        let score = tracker.score(&graph, 0).unwrap();
        assert_eq!(score.fill_ins, 1);
        assert!(!score.is_simplicial());
        assert_abs_diff_eq!(score.log_weight, 8f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(score.log_cost(), 8f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_simplicial_preferred() {
        // Triangle 0-1-2 with pendant 3 attached to 2
        let graph =
            UndirectedGraph::from_edges(0..4, &[(0, 1), (1, 2), (0, 2), (2, 3)]).unwrap();
        let sizes: DomainSizes = (0..4).map(|n| (n, 2)).collect();
        let mut tracker = FillInTracker::new();
        tracker.set_graph(&graph, &sizes).unwrap();

        // 3 is simplicial with the lightest clique {2, 3}
        assert_eq!(tracker.best_node(&graph, graph.nodes()).unwrap(), Some(3));
    }

    #[test]
    fn test_domain_sizes_weight_the_choice() {
        let (graph, mut sizes) = square();
        sizes.insert(0, 10);
        sizes.insert(1, 10);
        let mut tracker = FillInTracker::new();
        tracker.set_graph(&graph, &sizes).unwrap();

        // Every node adds one fill-in; 2 and 3 avoid one of the heavy nodes
        assert_eq!(tracker.best_node(&graph, graph.nodes()).unwrap(), Some(2));
    }

    #[test]
    fn test_eliminate_invalidates_cache() {
        let (mut graph, sizes) = square();
        let mut tracker = FillInTracker::new();
        tracker.set_graph(&graph, &sizes).unwrap();
        assert_eq!(tracker.score(&graph, 1).unwrap().fill_ins, 1);

        let fill_ins = tracker.eliminate(&mut graph, 0).unwrap();
        assert_eq!(fill_ins, vec![Edge::new(1, 3)]);

        // 1 now has neighbours {2, 3}, which are adjacent
        let score = tracker.score(&graph, 1).unwrap();
        assert_eq!(score.fill_ins, 0);
        assert!(score.is_simplicial());
    }
}
