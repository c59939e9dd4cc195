//! Error types shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::tree::NodeId;

/// A rotation or reflection value outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("invalid transformation: rotation {0} is not one of 0, 90, 180, 270")]
    InvalidRotation(i32),

    #[error("invalid transformation: unknown reflection {0:?}")]
    InvalidReflection(String),

    #[error("invalid transformation: unknown rotate direction {0:?}")]
    InvalidDirection(String),
}

/// Lookups and edits against a single game tree value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} not found in game tree")]
    NodeNotFound(NodeId),
}

/// The path from the setup node to the cursor could not be replayed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("recorded move {point:?} at node {node} is illegal")]
    IllegalMove { node: NodeId, point: String },

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Problems found while reading SGF text or SGF coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SgfError {
    #[error("malformed SGF: input is empty")]
    Empty,

    #[error("malformed SGF: unexpected {found:?} at byte {offset}")]
    Unexpected { offset: usize, found: char },

    #[error("malformed SGF: property value starting at byte {offset} is never closed")]
    UnterminatedValue { offset: usize },

    #[error("malformed SGF: property {0} has no value")]
    MissingValue(String),

    #[error("malformed SGF: unbalanced parentheses")]
    UnbalancedParens,

    #[error("invalid SGF coordinate {0:?}")]
    InvalidCoordinate(String),
}

/// Failures while fetching puzzle files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("problem {category}/{id} not found at {path}")]
    NotFound {
        category: String,
        id: u32,
        path: PathBuf,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sgf(#[from] SgfError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Failures while reading the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
}
