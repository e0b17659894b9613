//! streamer-core: Catalog synchronization and placeholder planning
//!
//! This crate provides:
//! - Texture and scene catalogs stored as flat, depth-tagged lists
//! - `SyncEngine` to rebuild a catalog from dependency and bundle visitors
//! - Deterministic placeholder path mapping and reconcile plans
//! - Bundle build planning around an external build command
//! - Catalog persistence through a `FileSystem` abstraction

pub mod artifacts;
pub mod bundles;
pub mod catalog;
pub mod columns;
pub mod fs;
pub mod placeholder;
pub mod reconcile;
pub mod store;
pub mod sync_engine;
pub mod visitor;

pub use artifacts::{ArtifactDirectory, AssetIdentity, BuiltArtifactIndex, GuidTable, HashedAssetIds};
pub use bundles::{BuildCommand, BuildError, BuildOutcome, BuildRequest, BundleSpec};
pub use catalog::{
    Catalog, CatalogItem, SceneCatalog, SceneInfo, SceneItem, SceneStatus, TextureCatalog, TextureInfo,
    TextureItem, TextureStatus,
};
pub use columns::{SceneColumn, TextureColumn};
pub use fs::{FileEntry, FileStat, FileSystem, FsError, InMemoryFs};
pub use placeholder::{PathMappingError, PlaceholderLayout};
pub use reconcile::{ApplyReport, PlaceholderWriter, ReconcilePlan, apply_plan, reconcile, refresh_placeholder_paths};
pub use store::{CatalogStore, StoreError};
pub use sync_engine::{AssetInspector, SyncEngine, SyncError, SyncOutcome, SyncReport, TextureStats, sync_scenes};
pub use visitor::{
    ARTIFACT_CONTAINER, AssetKind, AssetVisitor, BundleVisitor, ContainerEntry, ContainerVisitor,
    DependencyManifest, KindRules, VisitSink, VisitorError,
};
