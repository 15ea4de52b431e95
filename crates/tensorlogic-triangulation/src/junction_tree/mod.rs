//! Junction tree construction strategies.
//!
//! A junction tree (clique tree) is a tree of cliques satisfying the running
//! intersection property: for every variable, the cliques containing it form a
//! connected subtree. It is the backbone of exact inference.
//!
//! # Algorithm Overview
//!
//! ```text
//! Moral graph → Eliminate → Eliminated cliques → Elimination tree → Junction tree
//!                   ↓               ↓                    ↓                 ↓
//!              Fill-ins      {v} ∪ neighbours     parent = next      merge / span
//!                                                 eliminated nbr
//! ```
//!
//! Two strategies are provided:
//!
//! - [`DefaultJunctionTreeStrategy`]: collapses every non-maximal clique of the
//!   elimination tree into the neighbouring clique that contains it
//! - [`SpanningJunctionTreeStrategy`]: keeps the maximal eliminated cliques and
//!   connects them by a maximum-weight spanning tree on separator sizes
//!
//! # References
//!
//! - Koller & Friedman, "Probabilistic Graphical Models", Chapter 10
//! - Jensen & Jensen, "Optimal Junction Trees" (1994)

mod default;
mod spanning;

pub use default::DefaultJunctionTreeStrategy;
pub use spanning::SpanningJunctionTreeStrategy;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::clique_graph::{CliqueGraph, CliqueId};
use crate::error::{Result, TriangulationError};
use crate::graph::NodeId;
use crate::record::EliminationRecord;

/// Policy assembling a junction tree from the outcome of an elimination.
pub trait JunctionTreeStrategy: fmt::Debug {
    /// Whether the strategy needs the fill-in edges of the elimination.
    fn requires_fill_ins(&self) -> bool;

    /// Bind the strategy to the outcome of a triangulation, dropping any
    /// previously computed tree.
    fn set_triangulation(&mut self, triangulation: Rc<EliminationRecord>);

    /// The junction tree, computed on first access.
    ///
    /// Fails with `UndefinedElement` if no triangulation is bound.
    fn junction_tree(&mut self) -> Result<&CliqueGraph>;

    /// For each eliminated node, the junction tree clique created by (or
    /// absorbing) its elimination.
    fn created_cliques(&mut self) -> Result<&BTreeMap<NodeId, CliqueId>>;

    /// Junction tree clique created by the elimination of `node`.
    fn created_clique(&mut self, node: NodeId) -> Result<CliqueId>;

    /// Drop the binding and every memoized result.
    fn clear(&mut self);
}

/// Error for queries made before a triangulation is bound.
pub(crate) fn unbound() -> TriangulationError {
    TriangulationError::UndefinedElement(
        "no triangulation bound to the junction tree strategy".to_string(),
    )
}

/// Lookup shared by the strategies' `created_clique`.
pub(crate) fn lookup_created_clique(
    created: &BTreeMap<NodeId, CliqueId>,
    node: NodeId,
) -> Result<CliqueId> {
    created.get(&node).copied().ok_or_else(|| {
        TriangulationError::UndefinedElement(format!("node {} was not eliminated", node))
    })
}
