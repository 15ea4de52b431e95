//! Junction tree obtained as a maximum spanning tree of the maximal cliques.

use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

use super::{lookup_created_clique, unbound, JunctionTreeStrategy};
use crate::clique_graph::{CliqueGraph, CliqueId};
use crate::error::{Result, TriangulationError};
use crate::graph::{NodeId, NodeSet};
use crate::record::EliminationRecord;

/// Junction tree strategy based on separator weights.
///
/// Keeps the eliminated cliques that are maximal and links them with a
/// maximum-weight spanning tree where the weight of two cliques is the size of
/// their intersection (Prim's algorithm). Cliques sharing no variable are never
/// linked, so a disconnected graph yields a forest.
#[derive(Debug, Default)]
pub struct SpanningJunctionTreeStrategy {
    triangulation: Option<Rc<EliminationRecord>>,
    junction_tree: Option<CliqueGraph>,
    created_cliques: BTreeMap<NodeId, CliqueId>,
}

impl SpanningJunctionTreeStrategy {
    /// Create an unbound strategy.
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_computed(&mut self) -> Result<()> {
        if self.junction_tree.is_some() {
            return Ok(());
        }
        let record = self.triangulation.as_ref().ok_or_else(unbound)?;

        let cliques = record.eliminated_cliques();
        let maximal: Vec<(CliqueId, &NodeSet)> = cliques
            .iter()
            .filter(|&(id, nodes)| {
                !cliques
                    .iter()
                    .any(|(other, others)| other != id && nodes.is_subset(others))
            })
            .map(|(&id, nodes)| (id, nodes))
            .collect();

        let tree = Self::build_maximum_spanning_tree(&maximal)?;

        let mut created = BTreeMap::new();
        for (&node, nodes) in cliques {
            let (id, _) = maximal
                .iter()
                .find(|(_, candidate)| nodes.is_subset(candidate))
                .ok_or_else(|| {
                    TriangulationError::UndefinedElement(format!(
                        "no maximal clique contains the clique of node {}",
                        node
                    ))
                })?;
            created.insert(node, *id);
        }

        debug!(
            cliques = tree.size(),
            separators = tree.size_edges(),
            "junction tree built by maximum spanning tree"
        );
        self.junction_tree = Some(tree);
        self.created_cliques = created;
        Ok(())
    }

    /// Prim's algorithm with separator size as edge weight.
    fn build_maximum_spanning_tree(cliques: &[(CliqueId, &NodeSet)]) -> Result<CliqueGraph> {
        let mut tree = CliqueGraph::new();
        for &(id, nodes) in cliques {
            tree.add_clique_with_id(id, nodes.clone())?;
        }

        let n = cliques.len();
        let mut in_tree = vec![false; n];
        // Heaviest positive link of each clique to the tree: (weight, tree clique index)
        let mut best: Vec<Option<(usize, usize)>> = vec![None; n];

        for _ in 0..n {
            // Prefer the heaviest link; with none left, start a new component
            let Some(next) = (0..n).filter(|&i| !in_tree[i]).max_by(|&a, &b| {
                let wa = best[a].map_or(0, |(w, _)| w);
                let wb = best[b].map_or(0, |(w, _)| w);
                wa.cmp(&wb).then_with(|| b.cmp(&a))
            }) else {
                break;
            };

            in_tree[next] = true;
            if let Some((_, from)) = best[next] {
                tree.add_edge(cliques[from].0, cliques[next].0)?;
            }

            for j in 0..n {
                if in_tree[j] {
                    continue;
                }
                let weight = cliques[next].1.intersection(cliques[j].1).count();
                if weight > 0 && best[j].map_or(true, |(w, _)| weight > w) {
                    best[j] = Some((weight, next));
                }
            }
        }

        Ok(tree)
    }
}

impl JunctionTreeStrategy for SpanningJunctionTreeStrategy {
    fn requires_fill_ins(&self) -> bool {
        false
    }

    fn set_triangulation(&mut self, triangulation: Rc<EliminationRecord>) {
        self.clear();
        self.triangulation = Some(triangulation);
    }

    fn junction_tree(&mut self) -> Result<&CliqueGraph> {
        self.ensure_computed()?;
        self.junction_tree.as_ref().ok_or_else(unbound)
    }

    fn created_cliques(&mut self) -> Result<&BTreeMap<NodeId, CliqueId>> {
        self.ensure_computed()?;
        Ok(&self.created_cliques)
    }

    fn created_clique(&mut self, node: NodeId) -> Result<CliqueId> {
        self.ensure_computed()?;
        lookup_created_clique(&self.created_cliques, node)
    }

    fn clear(&mut self) {
        self.triangulation = None;
        self.junction_tree = None;
        self.created_cliques.clear();
    }
}
