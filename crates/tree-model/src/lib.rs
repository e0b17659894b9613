//! tree-model: Generic hierarchical model stored as a flat, depth-tagged list.
//!
//! This crate provides:
//! - Validation and reconstruction of a tree from a pre-order list (`ListToTree`)
//! - Flattening back into that list (`TreeToList`)
//! - Reparenting with cycle rejection (`MoveElements`)
//! - Search, row projection and column sorting for display layers
//! - Change notification through an `EventBus`
//!
//! Nodes live in an arena and refer to each other through handles, so a child
//! never owns its parent.

pub mod error;
pub mod events;
pub mod item;
pub mod model;
pub mod rows;
pub mod sort;

pub use error::{HierarchyViolation, MoveRejection, TreeError};
pub use events::{EventBus, ModelEvent, Subscription};
pub use item::{ItemId, ROOT_DEPTH, ROOT_ID, TreeItem};
pub use model::{TreeModel, validate_depths};
pub use rows::Row;
pub use sort::{Column, SortDirection, SortSpec, compare_by, natural_cmp};
