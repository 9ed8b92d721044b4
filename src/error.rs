//! Error types.
//!
//! Only parsing and host calls can fail. Event-driven paths (listener and
//! timer callbacks) log and recover locally instead of returning these.

use thiserror::Error;

use crate::dom::NodeId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A placement string that is not one of the eight known placements.
    #[error("unknown placement `{0}`")]
    UnknownPlacement(String),

    /// An interaction mode other than `hover`, `click` or `focus`.
    #[error("unknown interaction `{0}`")]
    UnknownInteraction(String),

    /// The host has no node with this id (never rendered, or removed).
    #[error("node {0} is not mounted")]
    UnknownNode(NodeId),

    /// The layout engine rejected an operation.
    #[error("layout engine error: {0}")]
    Layout(String),
}

impl From<taffy::TaffyError> for Error {
    fn from(err: taffy::TaffyError) -> Self {
        Error::Layout(format!("{err:?}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
