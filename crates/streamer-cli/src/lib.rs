//! streamer-cli library: native collaborators and project commands.
//!
//! This is a thin library layer under the `asset-streamer` binary,
//! allowing integration tests to drive whole commands.

pub mod build_runner;
pub mod config;
pub mod inspector;
pub mod lock;
pub mod native_fs;
pub mod placeholder_writer;
pub mod project;

pub use config::{Config, ConfigError, Paths};
pub use lock::{CatalogLock, LockError};
pub use native_fs::NativeFs;
pub use project::{PlaceholderRun, Project, TreeQuery, parse_sort};
