//! Error types for graph mutations.

use thiserror::Error;

use crate::identifier::Id;

/// Attaching `node` under `container` would close a containment loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("adding `{node}` to container `{container}` would create a containment cycle")]
pub struct CycleError {
    pub container: Id,
    pub node: Id,
}

/// Errors returned by structural and positional graph operations.
///
/// A failed operation never leaves the graph partially modified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("node `{0}` already exists")]
    DuplicateNode(Id),

    #[error("edge `{0}` already exists")]
    DuplicateEdge(Id),

    #[error("unknown node `{0}`")]
    UnknownNode(Id),

    #[error("unknown edge `{0}`")]
    UnknownEdge(Id),

    #[error("node `{0}` is not a container")]
    NotAContainer(Id),

    #[error("node `{node}` is not a child of container `{container}`")]
    NotAChild { container: Id, node: Id },

    #[error("edge `{edge}` references missing node `{node}`")]
    DanglingEdge { edge: Id, node: Id },

    #[error("position of node `{0}` is not finite")]
    NonFinitePosition(Id),

    #[error(transparent)]
    Cycle(#[from] CycleError),
}

/// A type alias for `Result<T, GraphError>`.
pub type Result<T> = std::result::Result<T, GraphError>;
