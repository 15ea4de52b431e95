//! Junction tree obtained by collapsing the elimination tree.

use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, trace};

use super::{lookup_created_clique, unbound, JunctionTreeStrategy};
use crate::clique_graph::{CliqueGraph, CliqueId};
use crate::error::Result;
use crate::graph::NodeId;
use crate::record::EliminationRecord;

/// Default junction tree strategy.
///
/// Starts from the elimination tree, in which the clique of each eliminated
/// node hangs below the clique of its earliest eliminated later neighbour.
/// Walking the cliques in elimination order, a clique contained in one of its
/// already visited neighbours is merged into that neighbour, which inherits
/// all of its other edges. What remains are exactly the maximal cliques of the
/// triangulated graph.
#[derive(Debug, Default)]
pub struct DefaultJunctionTreeStrategy {
    triangulation: Option<Rc<EliminationRecord>>,
    junction_tree: Option<CliqueGraph>,
    created_cliques: BTreeMap<NodeId, CliqueId>,
}

impl DefaultJunctionTreeStrategy {
    /// Create an unbound strategy.
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_computed(&mut self) -> Result<()> {
        if self.junction_tree.is_some() {
            return Ok(());
        }
        let record = self.triangulation.as_ref().ok_or_else(unbound)?;
        let (tree, created) = Self::collapse(record)?;
        debug!(
            cliques = tree.size(),
            eliminated = record.elimination_order().len(),
            "junction tree built by merging non-maximal cliques"
        );
        self.junction_tree = Some(tree);
        self.created_cliques = created;
        Ok(())
    }

    fn collapse(
        record: &EliminationRecord,
    ) -> Result<(CliqueGraph, BTreeMap<NodeId, CliqueId>)> {
        let mut tree = record.elimination_tree().clone();
        let mut absorbed_by: BTreeMap<CliqueId, CliqueId> = BTreeMap::new();

        for &clique_id in record.elimination_order() {
            let position = record.position(clique_id);
            let content = tree.clique(clique_id)?;
            let target = tree.neighbours(clique_id)?.iter().copied().find(|&n| {
                record.position(n) < position
                    && tree.clique(n).is_ok_and(|other| content.is_subset(other))
            });

            if let Some(target) = target {
                let others: Vec<CliqueId> = tree
                    .neighbours(clique_id)?
                    .iter()
                    .copied()
                    .filter(|&n| n != target)
                    .collect();
                tree.erase_clique(clique_id)?;
                for other in others {
                    tree.add_edge(target, other)?;
                }
                absorbed_by.insert(clique_id, target);
                trace!(clique = clique_id, into = target, "non-maximal clique merged");
            }
        }

        let created = record
            .elimination_order()
            .iter()
            .map(|&node| {
                let mut clique = node;
                while let Some(&target) = absorbed_by.get(&clique) {
                    clique = target;
                }
                (node, clique)
            })
            .collect();

        Ok((tree, created))
    }
}

impl JunctionTreeStrategy for DefaultJunctionTreeStrategy {
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
