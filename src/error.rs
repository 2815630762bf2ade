//! Error types for the inference engine.
//!
//! Inference itself never fails: imprecision degrades to `Unknown`. The only
//! errors are contract violations by whoever built the AST. Each one aborts
//! the top-level statement it occurs in and is recorded on the result.

use thiserror::Error;

use crate::ast::{NodeId, Span};

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferError>;

/// Main error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferError {
    #[error("Malformed AST: {0}")]
    Malformed(#[from] MalformedAst),
}

impl InferError {
    pub fn span(&self) -> Span {
        match self {
            InferError::Malformed(e) => e.span(),
        }
    }

    /// The offending node.
    pub fn node(&self) -> NodeId {
        match self {
            InferError::Malformed(e) => e.node(),
        }
    }
}

/// AST shapes the engine refuses to analyse.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedAst {
    #[error("call expression {node} has no callee")]
    MissingCallee { node: NodeId, span: Span },

    #[error("invalid assignment target at {node}")]
    InvalidAssignmentTarget { node: NodeId, span: Span },

    #[error("member access {node} has an empty property name")]
    EmptyPropertyName { node: NodeId, span: Span },

    #[error("'return' outside of function")]
    ReturnOutsideFunction { node: NodeId, span: Span },

    #[error("node id {node} appears more than once")]
    DuplicateNodeId { node: NodeId, span: Span },
}

impl MalformedAst {
    pub fn span(&self) -> Span {
        match self {
            MalformedAst::MissingCallee { span, .. } => *span,
            MalformedAst::InvalidAssignmentTarget { span, .. } => *span,
            MalformedAst::EmptyPropertyName { span, .. } => *span,
            MalformedAst::ReturnOutsideFunction { span, .. } => *span,
            MalformedAst::DuplicateNodeId { span, .. } => *span,
        }
    }

    pub fn node(&self) -> NodeId {
        match self {
            MalformedAst::MissingCallee { node, .. }
            | MalformedAst::InvalidAssignmentTarget { node, .. }
            | MalformedAst::EmptyPropertyName { node, .. }
            | MalformedAst::ReturnOutsideFunction { node, .. }
            | MalformedAst::DuplicateNodeId { node, .. } => *node,
        }
    }
}
