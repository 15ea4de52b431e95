//! Clique graphs: elimination trees and junction trees.
//!
//! A [`CliqueGraph`] is an undirected graph whose nodes are cliques (sets of
//! variables of the triangulated graph) and whose edges carry a separator, the
//! intersection of the two adjacent cliques.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::error::{Result, TriangulationError};
use crate::graph::{log10_domain_size, DomainSizes, Edge, NodeId, NodeSet};

/// Identifier of a clique.
///
/// Cliques built by triangulation reuse the identifier of the eliminated node
/// that created them.
pub type CliqueId = NodeId;

/// A graph of cliques.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliqueGraph {
    /// Clique contents
    cliques: BTreeMap<CliqueId, NodeSet>,
    /// Adjacency: clique -> neighbouring cliques
    adjacency: BTreeMap<CliqueId, BTreeSet<CliqueId>>,
    /// Number of edges
    num_edges: usize,
}

impl CliqueGraph {
    /// Create an empty clique graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clique with a given identifier.
    pub fn add_clique_with_id(&mut self, id: CliqueId, nodes: NodeSet) -> Result<()> {
        if self.cliques.contains_key(&id) {
            return Err(TriangulationError::OperationNotAllowed(format!(
                "clique {} already exists",
                id
            )));
        }
        self.cliques.insert(id, nodes);
        self.adjacency.insert(id, BTreeSet::new());
        Ok(())
    }

    /// Remove a clique and its incident edges.
    pub fn erase_clique(&mut self, id: CliqueId) -> Result<NodeSet> {
        let nodes = self.cliques.remove(&id).ok_or_else(|| Self::unknown(id))?;
        if let Some(neighbours) = self.adjacency.remove(&id) {
            for neighbour in &neighbours {
                if let Some(adj) = self.adjacency.get_mut(neighbour) {
                    adj.remove(&id);
                }
            }
            self.num_edges -= neighbours.len();
        }
        Ok(nodes)
    }

    /// Connect two cliques. Returns `true` if the edge was not already present.
    pub fn add_edge(&mut self, a: CliqueId, b: CliqueId) -> Result<bool> {
        if a == b {
            return Err(TriangulationError::OperationNotAllowed(format!(
                "self loop on clique {}",
                a
            )));
        }
        if !self.exists_clique(a) {
            return Err(Self::unknown(a));
        }
        if !self.exists_clique(b) {
            return Err(Self::unknown(b));
        }
        let inserted = self.adjacency.entry(a).or_default().insert(b);
        if inserted {
            self.adjacency.entry(b).or_default().insert(a);
            self.num_edges += 1;
        }
        Ok(inserted)
    }

    /// Check whether a clique exists.
    pub fn exists_clique(&self, id: CliqueId) -> bool {
        self.cliques.contains_key(&id)
    }

    /// Check whether two cliques are adjacent.
    pub fn exists_edge(&self, a: CliqueId, b: CliqueId) -> bool {
        self.adjacency
            .get(&a)
            .map(|adj| adj.contains(&b))
            .unwrap_or(false)
    }

    /// Content of a clique.
    pub fn clique(&self, id: CliqueId) -> Result<&NodeSet> {
        self.cliques.get(&id).ok_or_else(|| Self::unknown(id))
    }

    /// Iterate over `(id, content)` pairs in increasing id order.
    pub fn cliques(&self) -> impl Iterator<Item = (CliqueId, &NodeSet)> + '_ {
        self.cliques.iter().map(|(&id, nodes)| (id, nodes))
    }

    /// Clique identifiers in increasing order.
    pub fn clique_ids(&self) -> impl Iterator<Item = CliqueId> + '_ {
        self.cliques.keys().copied()
    }

    /// Neighbouring cliques.
    pub fn neighbours(&self, id: CliqueId) -> Result<&BTreeSet<CliqueId>> {
        self.adjacency.get(&id).ok_or_else(|| Self::unknown(id))
    }

    /// Iterate over the edges, each reported once.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.adjacency.iter().flat_map(|(&id, adj)| {
            adj.range(id + 1..)
                .map(move |&neighbour| Edge::new(id, neighbour))
        })
    }

    /// Separator of two adjacent cliques.
    pub fn separator(&self, a: CliqueId, b: CliqueId) -> Result<NodeSet> {
        if !self.exists_edge(a, b) {
            return Err(TriangulationError::UndefinedElement(format!(
                "no edge between cliques {} and {}",
                a, b
            )));
        }
        Ok(self.clique(a)?.intersection(self.clique(b)?).copied().collect())
    }

    /// Number of cliques.
    pub fn size(&self) -> usize {
        self.cliques.len()
    }

    /// Number of edges.
    pub fn size_edges(&self) -> usize {
        self.num_edges
    }

    /// Check whether there is no clique.
    pub fn is_empty(&self) -> bool {
        self.cliques.is_empty()
    }

    /// Cliques containing `node`, in increasing id order.
    pub fn cliques_containing(&self, node: NodeId) -> Vec<CliqueId> {
        self.cliques
            .iter()
            .filter(|(_, nodes)| nodes.contains(&node))
            .map(|(&id, _)| id)
            .collect()
    }

    /// Union of all clique contents.
    pub fn variables(&self) -> NodeSet {
        self.cliques.values().flatten().copied().collect()
    }

    /// Size of the largest clique minus one.
    pub fn treewidth(&self) -> usize {
        self.cliques
            .values()
            .map(|nodes| nodes.len())
            .max()
            .unwrap_or(0)
            .saturating_sub(1)
    }

    /// Largest `log10` of the domain size product of a clique.
    pub fn max_log10_domain_size(&self, domain_sizes: &DomainSizes) -> Result<f64> {
        self.cliques.values().try_fold(0.0_f64, |max, nodes| {
            Ok(max.max(log10_domain_size(nodes, domain_sizes)?))
        })
    }

    /// Check that the graph has no cycle.
    pub fn is_forest(&self) -> bool {
        let mut visited = HashSet::new();
        let mut components = 0;
        for &start in self.cliques.keys() {
            if visited.insert(start) {
                components += 1;
                self.reach(start, |_| true, &mut visited);
            }
        }
        self.num_edges + components == self.cliques.len()
    }

    /// Check the running intersection property.
    ///
    /// For every variable, the cliques containing it form a connected subtree.
    pub fn verify_running_intersection_property(&self) -> bool {
        let mut var_to_cliques: BTreeMap<NodeId, Vec<CliqueId>> = BTreeMap::new();
        for (&id, nodes) in &self.cliques {
            for &node in nodes {
                var_to_cliques.entry(node).or_default().push(id);
            }
        }

        var_to_cliques
            .values()
            .all(|cliques| cliques.len() <= 1 || self.is_connected_subgraph(cliques))
    }

    /// Check whether a set of cliques forms a connected subgraph.
    fn is_connected_subgraph(&self, cliques: &[CliqueId]) -> bool {
        let Some(&start) = cliques.first() else {
            return true;
        };
        let clique_set: HashSet<CliqueId> = cliques.iter().copied().collect();
        let mut visited = HashSet::new();
        visited.insert(start);
        self.reach(start, |id| clique_set.contains(&id), &mut visited);
        visited.len() == clique_set.len()
    }

    /// Breadth-first search from `start` through cliques accepted by `keep`.
    fn reach(
        &self,
        start: CliqueId,
        keep: impl Fn(CliqueId) -> bool,
        visited: &mut HashSet<CliqueId>,
    ) {
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if let Some(neighbours) = self.adjacency.get(&current) {
                for &n in neighbours {
                    if keep(n) && visited.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
        }
    }

    fn unknown(id: CliqueId) -> TriangulationError {
        TriangulationError::UndefinedElement(format!("clique {} does not exist", id))
    }
}
