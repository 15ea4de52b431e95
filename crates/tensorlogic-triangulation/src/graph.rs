//! Undirected graph representation.
//!
//! The triangulation engine works on a mutable copy of an undirected graph
//! (typically the moralized graph of a Bayesian network). Nodes are small
//! unsigned integers and edges are unordered pairs.
//!
//! Every mutation comes in two flavours: a public, validated method that emits
//! a `trace!` event, and a crate-private `*_raw` method used by bulk internal
//! updates such as node elimination, which skips both validation and logging.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::trace;

use crate::error::{Result, TriangulationError};

/// Identifier of a node of the graph.
pub type NodeId = usize;

/// Ordered set of nodes. Ordering makes every traversal deterministic.
pub type NodeSet = BTreeSet<NodeId>;

/// Ordered set of undirected edges.
pub type EdgeSet = BTreeSet<Edge>;

/// Domain cardinality of each node.
///
/// Entries for nodes that are not in the graph are tolerated and ignored.
pub type DomainSizes = HashMap<NodeId, usize>;

/// An undirected edge, stored with its smaller endpoint first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    first: NodeId,
    second: NodeId,
}

impl Edge {
    /// Create the edge between `a` and `b` (order of the arguments is irrelevant).
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }

    /// Smaller endpoint.
    pub fn first(&self) -> NodeId {
        self.first
    }

    /// Larger endpoint.
    pub fn second(&self) -> NodeId {
        self.second
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.first, self.second)
    }
}

/// Undirected graph stored as adjacency sets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndirectedGraph {
    /// Adjacency: node -> neighbours
    adjacency: BTreeMap<NodeId, NodeSet>,
    /// Number of edges
    num_edges: usize,
}

impl UndirectedGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a node list and an edge list.
    ///
    /// Endpoints of the edges must belong to `nodes`.
    pub fn from_edges(
        nodes: impl IntoIterator<Item = NodeId>,
        edges: &[(NodeId, NodeId)],
    ) -> Result<Self> {
        let mut graph = Self::new();
        for node in nodes {
            graph.adjacency.entry(node).or_default();
        }
        for &(a, b) in edges {
            graph.add_edge(a, b)?;
        }
        Ok(graph)
    }

    /// Add a node with a fresh identifier (one past the largest one in use).
    pub fn add_node(&mut self) -> NodeId {
        let id = self
            .adjacency
            .keys()
            .next_back()
            .map(|max| max + 1)
            .unwrap_or(0);
        self.adjacency.insert(id, NodeSet::new());
        trace!(node = id, "node added");
        id
    }

    /// Add a node with a given identifier.
    pub fn add_node_with_id(&mut self, id: NodeId) -> Result<()> {
        if self.adjacency.contains_key(&id) {
            return Err(TriangulationError::OperationNotAllowed(format!(
                "node {} already exists",
                id
            )));
        }
        self.adjacency.insert(id, NodeSet::new());
        trace!(node = id, "node added");
        Ok(())
    }

    /// Remove a node and all its incident edges.
    pub fn erase_node(&mut self, id: NodeId) -> Result<()> {
        match self.erase_node_raw(id) {
            Some(neighbours) => {
                trace!(node = id, degree = neighbours.len(), "node erased");
                Ok(())
            }
            None => Err(TriangulationError::UndefinedElement(format!(
                "node {} is not in the graph",
                id
            ))),
        }
    }

    /// Remove a node without validation, returning its former neighbours.
    pub(crate) fn erase_node_raw(&mut self, id: NodeId) -> Option<NodeSet> {
        let neighbours = self.adjacency.remove(&id)?;
        for neighbour in &neighbours {
            if let Some(adj) = self.adjacency.get_mut(neighbour) {
                adj.remove(&id);
            }
        }
        self.num_edges -= neighbours.len();
        Some(neighbours)
    }

    /// Add the edge `a ~ b`. Returns `true` if the edge was not already present.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        if a == b {
            return Err(TriangulationError::OperationNotAllowed(format!(
                "self loop on node {}",
                a
            )));
        }
        for node in [a, b] {
            if !self.exists_node(node) {
                return Err(TriangulationError::OperationNotAllowed(format!(
                    "edge {}~{} refers to missing node {}",
                    a, b, node
                )));
            }
        }
        let added = self.add_edge_raw(a, b);
        if added {
            trace!(edge = %Edge::new(a, b), "edge added");
        }
        Ok(added)
    }

    /// Add an edge between two existing, distinct nodes without validation.
    pub(crate) fn add_edge_raw(&mut self, a: NodeId, b: NodeId) -> bool {
        let inserted = self.adjacency.entry(a).or_default().insert(b);
        if inserted {
            self.adjacency.entry(b).or_default().insert(a);
            self.num_edges += 1;
        }
        inserted
    }

    /// Remove the edge `a ~ b`. Returns `true` if the edge was present.
    pub fn erase_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        for node in [a, b] {
            if !self.exists_node(node) {
                return Err(TriangulationError::UndefinedElement(format!(
                    "node {} is not in the graph",
                    node
                )));
            }
        }
        let erased = self.erase_edge_raw(a, b);
        if erased {
            trace!(edge = %Edge::new(a, b), "edge erased");
        }
        Ok(erased)
    }

    /// Remove an edge without validation.
    pub(crate) fn erase_edge_raw(&mut self, a: NodeId, b: NodeId) -> bool {
        let erased = self
            .adjacency
            .get_mut(&a)
            .map(|adj| adj.remove(&b))
            .unwrap_or(false);
        if erased {
            if let Some(adj) = self.adjacency.get_mut(&b) {
                adj.remove(&a);
            }
            self.num_edges -= 1;
        }
        erased
    }

    /// Check whether a node belongs to the graph.
    pub fn exists_node(&self, id: NodeId) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// Check whether the edge `a ~ b` belongs to the graph.
    pub fn exists_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(&a)
            .map(|adj| adj.contains(&b))
            .unwrap_or(false)
    }

    /// Neighbours of a node.
    pub fn neighbours(&self, id: NodeId) -> Result<&NodeSet> {
        self.adjacency.get(&id).ok_or_else(|| {
            TriangulationError::UndefinedElement(format!("node {} is not in the graph", id))
        })
    }

    /// Number of neighbours of a node (0 for unknown nodes).
    pub fn degree(&self, id: NodeId) -> usize {
        self.adjacency.get(&id).map(|adj| adj.len()).unwrap_or(0)
    }

    /// Iterate over the nodes in increasing order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    /// The node set of the graph.
    pub fn node_set(&self) -> NodeSet {
        self.adjacency.keys().copied().collect()
    }

    /// Iterate over the edges, each reported once.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.adjacency.iter().flat_map(|(&node, adj)| {
            adj.range(node + 1..)
                .map(move |&neighbour| Edge::new(node, neighbour))
        })
    }

    /// The edge set of the graph.
    pub fn edge_set(&self) -> EdgeSet {
        self.edges().collect()
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of edges.
    pub fn size_edges(&self) -> usize {
        self.num_edges
    }

    /// Check whether the graph has no node.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Remove every node and edge.
    pub fn clear(&mut self) {
        self.adjacency.clear();
        self.num_edges = 0;
    }

    /// Pairs of `nodes` that are not adjacent.
    pub fn missing_edges_among(&self, nodes: &NodeSet) -> Vec<Edge> {
        let mut missing = Vec::new();
        for (i, &a) in nodes.iter().enumerate() {
            for &b in nodes.iter().skip(i + 1) {
                if !self.exists_edge(a, b) {
                    missing.push(Edge::new(a, b));
                }
            }
        }
        missing
    }

    /// Check whether `nodes` are pairwise adjacent.
    pub fn is_clique(&self, nodes: &NodeSet) -> bool {
        nodes.iter().enumerate().all(|(i, &a)| {
            nodes
                .iter()
                .skip(i + 1)
                .all(|&b| self.exists_edge(a, b))
        })
    }

    /// Edges that eliminating `node` now would add, without modifying the graph.
    pub fn fill_ins_of(&self, node: NodeId) -> Result<Vec<Edge>> {
        Ok(self.missing_edges_among(self.neighbours(node)?))
    }

    /// Eliminate a node: remove it and connect all its former neighbours.
    ///
    /// Returns the fill-in edges, i.e. the edges added among the neighbours.
    pub fn eliminate_node(&mut self, node: NodeId) -> Result<Vec<Edge>> {
        let neighbours = self.erase_node_raw(node).ok_or_else(|| {
            TriangulationError::UndefinedElement(format!("node {} is not in the graph", node))
        })?;
        Ok(self.connect_all_raw(&neighbours))
    }

    /// Connect all pairs of `nodes`, returning the edges that were added.
    pub(crate) fn connect_all_raw(&mut self, nodes: &NodeSet) -> Vec<Edge> {
        let mut added = Vec::new();
        for (i, &a) in nodes.iter().enumerate() {
            for &b in nodes.iter().skip(i + 1) {
                if self.add_edge_raw(a, b) {
                    added.push(Edge::new(a, b));
                }
            }
        }
        added
    }

    /// Maximum cardinality search.
    ///
    /// Visits the nodes by repeatedly choosing the unvisited node with the most
    /// visited neighbours (smallest identifier on ties). The reverse of the visit
    /// order is a perfect elimination order whenever the graph is chordal.
    pub fn max_cardinality_search(&self) -> Vec<NodeId> {
        let mut cardinality: BTreeMap<NodeId, usize> =
            self.adjacency.keys().map(|&node| (node, 0)).collect();
        let mut visit = Vec::with_capacity(self.size());

        while let Some(node) = cardinality
            .iter()
            .max_by(|(a_node, a_card), (b_node, b_card)| {
                a_card.cmp(b_card).then_with(|| b_node.cmp(a_node))
            })
            .map(|(&node, _)| node)
        {
            cardinality.remove(&node);
            visit.push(node);
            if let Some(neighbours) = self.adjacency.get(&node) {
                for neighbour in neighbours {
                    if let Some(card) = cardinality.get_mut(neighbour) {
                        *card += 1;
                    }
                }
            }
        }

        visit.reverse();
        visit
    }

    /// Check whether `order` is a perfect elimination order of this graph.
    ///
    /// `order` must contain every node exactly once. For each node, the
    /// neighbours eliminated after it must be pairwise adjacent.
    pub fn is_perfect_elimination_order(&self, order: &[NodeId]) -> bool {
        if order.len() != self.size() {
            return false;
        }
        let mut position = HashMap::with_capacity(order.len());
        for (pos, &node) in order.iter().enumerate() {
            if !self.exists_node(node) || position.insert(node, pos).is_some() {
                return false;
            }
        }

        for (pos, &node) in order.iter().enumerate() {
            let later: Vec<NodeId> = self.adjacency[&node]
                .iter()
                .copied()
                .filter(|n| position[n] > pos)
                .collect();
            // It suffices to check that the earliest later neighbour is adjacent to the others.
            if let Some(&first) = later.iter().min_by_key(|n| position[*n]) {
                if !later
                    .iter()
                    .all(|&other| other == first || self.exists_edge(first, other))
                {
                    return false;
                }
            }
        }
        true
    }

    /// Check whether the graph is chordal.
    pub fn is_chordal(&self) -> bool {
        self.is_perfect_elimination_order(&self.max_cardinality_search())
    }
}

/// Check that every node of `graph` has a strictly positive domain size.
pub fn check_domain_sizes(graph: &UndirectedGraph, domain_sizes: &DomainSizes) -> Result<()> {
    for node in graph.nodes() {
        match domain_sizes.get(&node) {
            None => return Err(TriangulationError::MissingDomainSize { node }),
            Some(&0) => return Err(TriangulationError::InvalidDomainSize { node, size: 0 }),
            Some(_) => {}
        }
    }
    Ok(())
}

/// Natural logarithm of the product of the domain sizes of `nodes`.
pub fn log_domain_size<'a>(
    nodes: impl IntoIterator<Item = &'a NodeId>,
    domain_sizes: &DomainSizes,
) -> Result<f64> {
    nodes.into_iter().try_fold(0.0, |acc, &node| {
        let size = domain_sizes
            .get(&node)
            .copied()
            .ok_or(TriangulationError::MissingDomainSize { node })?;
        Ok(acc + (size as f64).ln())
    })
}

/// Base 10 logarithm of the product of the domain sizes of `nodes`.
pub fn log10_domain_size<'a>(
    nodes: impl IntoIterator<Item = &'a NodeId>,
    domain_sizes: &DomainSizes,
) -> Result<f64> {
    Ok(log_domain_size(nodes, domain_sizes)? / std::f64::consts::LN_10)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(n: usize) -> UndirectedGraph {
        let edges: Vec<(NodeId, NodeId)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        UndirectedGraph::from_edges(0..n, &edges).unwrap()
    }

    #[test]
    fn test_edge_normalization() {
        let e = Edge::new(5, 2);
        assert_eq!(e.first(), 2);
        assert_eq!(e.second(), 5);
        assert_eq!(e, Edge::new(2, 5));
        assert_eq!(e.to_string(), "2~5");
    }

    #[test]
    fn test_graph_construction() {
        let graph = cycle(4);
        assert_eq!(graph.size(), 4);
        assert_eq!(graph.size_edges(), 4);
        assert!(graph.exists_edge(0, 1));
        assert!(graph.exists_edge(1, 0));
        assert!(!graph.exists_edge(0, 2));
        assert_eq!(graph.edges().count(), 4);
    }

    #[test]
    fn test_add_node_ids() {
        let mut graph = UndirectedGraph::new();
        assert_eq!(graph.add_node(), 0);
        graph.add_node_with_id(7).unwrap();
        assert_eq!(graph.add_node(), 8);
        assert!(graph.add_node_with_id(7).is_err());
    }

    #[test]
    fn test_invalid_edges() {
        let mut graph = UndirectedGraph::from_edges(0..2, &[]).unwrap();
        assert!(matches!(
            graph.add_edge(0, 0),
            Err(TriangulationError::OperationNotAllowed(_))
        ));
        assert!(matches!(
            graph.add_edge(0, 9),
            Err(TriangulationError::OperationNotAllowed(_))
        ));
        assert!(graph.add_edge(0, 1).unwrap());
        assert!(!graph.add_edge(1, 0).unwrap());
        assert_eq!(graph.size_edges(), 1);
    }

    #[test]
    fn test_erase() {
        let mut graph = cycle(4);
        assert!(graph.erase_edge(0, 1).unwrap());
        assert!(!graph.erase_edge(0, 1).unwrap());
        assert_eq!(graph.size_edges(), 3);

        graph.erase_node(2).unwrap();
        assert_eq!(graph.size(), 3);
        assert_eq!(graph.size_edges(), 1);
        assert!(graph.erase_node(2).is_err());
    }

    #[test]
    fn test_eliminate_node_adds_fill_ins() {
        let mut graph = cycle(4);
        assert_eq!(graph.fill_ins_of(0).unwrap(), vec![Edge::new(1, 3)]);

        let fill_ins = graph.eliminate_node(0).unwrap();
        assert_eq!(fill_ins, vec![Edge::new(1, 3)]);
        assert!(!graph.exists_node(0));
        assert!(graph.exists_edge(1, 3));
        assert_eq!(graph.size_edges(), 3);
    }

    #[test]
    fn test_chordality() {
        assert!(!cycle(4).is_chordal());
        assert!(cycle(3).is_chordal());

        let mut square = cycle(4);
        square.add_edge(0, 2).unwrap();
        assert!(square.is_chordal());
        assert!(square.is_perfect_elimination_order(&[1, 3, 0, 2]));
        assert!(!cycle(4).is_perfect_elimination_order(&[0, 1, 2, 3]));
    }

    #[test]
    fn test_is_clique() {
        let graph = cycle(3);
        assert!(graph.is_clique(&graph.node_set()));
        assert!(!cycle(4).is_clique(&cycle(4).node_set()));
    }

    #[test]
    fn test_domain_sizes() {
        let graph = cycle(3);
        let mut sizes: DomainSizes = (0..3).map(|n| (n, 2)).collect();
        assert!(check_domain_sizes(&graph, &sizes).is_ok());

        let log = log_domain_size(graph.node_set().iter(), &sizes).unwrap();
        assert!((log - 8f64.ln()).abs() < 1e-12);

        sizes.insert(1, 0);
        assert_eq!(
            check_domain_sizes(&graph, &sizes),
            Err(TriangulationError::InvalidDomainSize { node: 1, size: 0 })
        );
        sizes.remove(&1);
        assert_eq!(
            check_domain_sizes(&graph, &sizes),
            Err(TriangulationError::MissingDomainSize { node: 1 })
        );
    }
}
