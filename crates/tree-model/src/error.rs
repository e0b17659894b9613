//! Error types for tree reconstruction and structural edits.

use crate::item::ItemId;
use thiserror::Error;

/// Why a depth-tagged list cannot be turned into a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyViolation {
    /// The list has no items at all.
    Empty,
    /// The first item is not the root (depth must be -1).
    RootDepth { depth: i32 },
    /// The root must carry the reserved id 0.
    RootId { id: ItemId },
    /// Only the first item may have a negative depth.
    NegativeDepth { depth: i32 },
    /// Depth increased by more than one from the previous item.
    DepthJump { previous: i32, depth: i32 },
    /// The item right after the root must have depth 0.
    FirstChildDepth { depth: i32 },
    /// Two items share the same id.
    DuplicateId { id: ItemId },
}

impl std::fmt::Display for HierarchyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HierarchyViolation::Empty => write!(f, "list is empty"),
            HierarchyViolation::RootDepth { depth } => {
                write!(f, "root must have depth -1, found {}", depth)
            }
            HierarchyViolation::RootId { id } => write!(f, "root must have id 0, found {}", id),
            HierarchyViolation::NegativeDepth { depth } => {
                write!(f, "only the root may have a negative depth, found {}", depth)
            }
            HierarchyViolation::DepthJump { previous, depth } => write!(
                f,
                "depth cannot increase by more than 1 per row ({} -> {})",
                previous, depth
            ),
            HierarchyViolation::FirstChildDepth { depth } => {
                write!(f, "item after the root must have depth 0, found {}", depth)
            }
            HierarchyViolation::DuplicateId { id } => write!(f, "duplicate id {}", id),
        }
    }
}

/// Why a reparent request was refused. The tree is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    /// The destination parent does not exist.
    UnknownParent(ItemId),
    /// One of the items to move does not exist.
    UnknownItem(ItemId),
    /// The destination is one of the moved items or lies below one.
    Cycle { parent: ItemId, moved: ItemId },
    /// The synthetic root cannot be moved.
    RootNotMovable,
}

impl std::fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveRejection::UnknownParent(id) => write!(f, "unknown parent {}", id),
            MoveRejection::UnknownItem(id) => write!(f, "unknown item {}", id),
            MoveRejection::Cycle { parent, moved } => write!(
                f,
                "parent {} is item {} or one of its descendants",
                parent, moved
            ),
            MoveRejection::RootNotMovable => write!(f, "the root cannot be moved"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Malformed hierarchy at index {index}: {violation}")]
    MalformedHierarchy {
        index: usize,
        violation: HierarchyViolation,
    },

    #[error("Invalid move: {0}")]
    InvalidMove(MoveRejection),
}

pub type Result<T> = std::result::Result<T, TreeError>;
