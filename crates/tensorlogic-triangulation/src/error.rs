//! Error types for triangulation operations.

use thiserror::Error;

use crate::graph::NodeId;

/// Errors that can occur while triangulating a graph or assembling a junction tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriangulationError {
    /// A strategy has no node to offer (unbound, empty graph or exhausted order)
    #[error("Not found: {0}")]
    NotFound(String),
    /// The driver and a strategy disagree on the elimination sequence
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),
    /// A derived result was requested before a graph was bound, or the element is unknown
    #[error("Undefined element: {0}")]
    UndefinedElement(String),
    /// A graph mutation that the structure does not allow
    #[error("Operation not allowed: {0}")]
    OperationNotAllowed(String),
    /// The elimination strategy rejected the graph (order does not cover its nodes)
    #[error("Elimination order incompatible with graph: {0}")]
    IncompatibleOrder(String),
    /// A node of the graph has no entry in the domain size table
    #[error("Node {node} has no domain size")]
    MissingDomainSize { node: NodeId },
    /// Domain sizes must be strictly positive
    #[error("Node {node} has invalid domain size {size}")]
    InvalidDomainSize { node: NodeId, size: usize },
}

/// Result type for triangulation operations.
pub type Result<T> = std::result::Result<T, TriangulationError>;
