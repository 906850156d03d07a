//! Diagnostics raised while numbering configured roots.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::model::Location;

/// Name and position of a declaration, rendered as `Name (line N)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct NodeInfo {
    pub name: String,
    pub location: Location,
}

impl NodeInfo {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {})", self.name, self.location.line)
    }
}

/// A configured root is not an enum. Its traversal never starts.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("#[ordinal] must target an enum, but {node} is {kind} (non-enum)")]
pub struct NotComposite {
    pub node: NodeInfo,
    /// Concrete declaration kind, e.g. `pub unit struct`.
    pub kind: String,
}

/// Two configured roots both claim the output group of the same enum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlapError {
    /// The enum whose group collided.
    pub group: NodeInfo,
    /// Root being emitted when the collision was found.
    pub current: NodeInfo,
    /// Root that committed the group first.
    pub existing: NodeInfo,
}

impl fmt::Display for OverlapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group == self.current {
            write!(
                f,
                "#[ordinal] cannot target enum {} as its count would overlap with the #[ordinal] enum {}",
                self.current, self.existing
            )
        } else {
            write!(
                f,
                "#[ordinal] on enum {} cannot number enum {} as its count would overlap with the #[ordinal] enum {}",
                self.current, self.group, self.existing
            )
        }
    }
}

impl std::error::Error for OverlapError {}

/// The traversal of one root failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AssignError {
    /// A variant chain leads back to an enum already entered by this
    /// traversal (a cycle through `Box`, or two variants wrapping one enum).
    #[error(
        "#[ordinal] on enum {root} reaches enum {node} more than once; its variants do not form a tree"
    )]
    NotATree { root: NodeInfo, node: NodeInfo },
}

/// Committing a group failed.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Overlap(#[from] OverlapError),

    #[error("failed to write {artifact} for #[ordinal] enum {root}: {source}")]
    Io {
        artifact: String,
        root: NodeInfo,
        #[source]
        source: std::io::Error,
    },
}

/// Any error reported for a configured root.
#[derive(Debug, Error)]
pub enum OrdinalError {
    #[error(transparent)]
    NotComposite(#[from] NotComposite),

    #[error(transparent)]
    Assign(#[from] AssignError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl OrdinalError {
    /// Where the diagnostic should point.
    pub fn location(&self) -> &Location {
        match self {
            Self::NotComposite(e) => &e.node.location,
            Self::Assign(AssignError::NotATree { node, .. }) => &node.location,
            Self::Emit(EmitError::Overlap(e)) => &e.group.location,
            Self::Emit(EmitError::Io { root, .. }) => &root.location,
        }
    }

    pub fn is_overlap(&self) -> bool {
        matches!(self, Self::Emit(EmitError::Overlap(_)))
    }
}
