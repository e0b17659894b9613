//! Placeholder lifecycle: decide which placeholder files must be created or
//! deleted so the files on disk match the `usePlaceholder` annotations.
//!
//! [`reconcile`] is pure. [`apply_plan`] performs a plan through a
//! [`FileSystem`] and a [`PlaceholderWriter`].

use crate::catalog::TextureCatalog;
use crate::fs::FileSystem;
use crate::placeholder::{PathMappingError, PlaceholderLayout};

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

/// The minimal set of changes to bring placeholder files in line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Asset names that need a placeholder
    pub to_create: BTreeSet<String>,
    /// Placeholder paths to remove
    pub to_delete: BTreeSet<String>,
    /// Files under the placeholder root that no asset maps to. Left alone.
    pub unmapped: Vec<PathMappingError>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

pub fn reconcile<'a>(
    catalog: &TextureCatalog,
    existing: impl IntoIterator<Item = &'a str>,
    layout: &PlaceholderLayout,
) -> ReconcilePlan {
    let wanted: HashMap<&str, bool> = catalog
        .assets()
        .iter()
        .map(|item| (item.name.as_str(), item.payload.use_placeholder))
        .collect();

    let mut plan = ReconcilePlan::default();
    let mut satisfied = HashSet::new();

    for path in existing {
        match layout.inverse(path) {
            Ok(name) => {
                if wanted.get(name.as_str()) == Some(&true) {
                    satisfied.insert(name);
                } else {
                    debug!("Placeholder {} is no longer wanted", path);
                    plan.to_delete.insert(path.to_string());
                }
            }
            Err(e) => {
                warn!("Skipping placeholder file: {}", e);
                plan.unmapped.push(e);
            }
        }
    }

    for name in catalog.placeholder_names() {
        if !satisfied.contains(name) {
            plan.to_create.insert(name.to_string());
        }
    }

    info!(
        "Placeholder plan: {} to create, {} to delete, {} unmapped",
        plan.to_create.len(),
        plan.to_delete.len(),
        plan.unmapped.len()
    );
    plan
}

/// Produces a downsized copy of an asset at a placeholder path.
pub trait PlaceholderWriter {
    fn write_placeholder(&self, asset_name: &str, placeholder_path: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyFailure {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub created: Vec<String>,
    pub deleted: Vec<String>,
    pub failures: Vec<ApplyFailure>,
}

/// Carry out a plan. Deletions run first; a failed step is recorded and the
/// rest of the plan still runs.
pub fn apply_plan<F: FileSystem + ?Sized>(
    plan: &ReconcilePlan,
    layout: &PlaceholderLayout,
    fs: &F,
    writer: &dyn PlaceholderWriter,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    for path in &plan.to_delete {
        match fs.delete(path) {
            Ok(()) => report.deleted.push(path.clone()),
            Err(e) => {
                warn!("Failed to delete placeholder {}: {}", path, e);
                report.failures.push(ApplyFailure {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    for name in &plan.to_create {
        let path = layout.forward(name);
        match writer.write_placeholder(name, &path) {
            Ok(()) => report.created.push(path),
            Err(reason) => {
                warn!("Failed to create placeholder for {}: {}", name, reason);
                report.failures.push(ApplyFailure { path, reason });
            }
        }
    }

    info!(
        "Applied placeholder plan: {} created, {} deleted, {} failed",
        report.created.len(),
        report.deleted.len(),
        report.failures.len()
    );
    report
}

/// Re-derive every `placeholderPath` from the files now present.
pub fn refresh_placeholder_paths(
    catalog: TextureCatalog,
    layout: &PlaceholderLayout,
    existing: &HashSet<String>,
) -> TextureCatalog {
    catalog.map_payloads(|name, payload| {
        let path = layout.forward(name);
        payload.placeholder_path = existing.contains(&path).then_some(path);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogItem, TextureItem};
    use crate::fs::InMemoryFs;
    use std::cell::RefCell;

    fn catalog(entries: &[(&str, bool)]) -> TextureCatalog {
        let assets = entries.iter().map(|(name, use_placeholder)| {
            let mut item = TextureItem::asset(0, *name);
            item.payload.use_placeholder = *use_placeholder;
            item
        });
        TextureCatalog::from_assets(CatalogItem::root(), assets)
    }

    fn layout() -> PlaceholderLayout {
        PlaceholderLayout::new("Placeholders")
    }

    #[test]
    fn test_reconcile_concrete_scenario() {
        let layout = layout();
        let catalog = catalog(&[("tex/a.png", true), ("tex/b.png", false)]);
        let existing = [layout.forward("tex/b.png")];

        let plan = reconcile(&catalog, existing.iter().map(String::as_str), &layout);
        assert_eq!(plan.to_create, BTreeSet::from(["tex/a.png".to_string()]));
        assert_eq!(plan.to_delete, BTreeSet::from([layout.forward("tex/b.png")]));
        assert!(plan.unmapped.is_empty());
    }

    #[test]
    fn test_reconcile_deletes_orphans_and_keeps_satisfied() {
        let layout = layout();
        let catalog = catalog(&[("a.png", true)]);
        let existing = vec![layout.forward("a.png"), layout.forward("gone.png")];

        let plan = reconcile(&catalog, existing.iter().map(String::as_str), &layout);
        assert!(plan.to_create.is_empty());
        assert_eq!(plan.to_delete, BTreeSet::from([layout.forward("gone.png")]));
    }

    #[test]
    fn test_reconcile_reports_unmapped_files() {
        let layout = layout();
        let catalog = catalog(&[("a.png", false)]);
        let existing = ["Placeholders/readme.txt", "Placeholders/a-0.png"];

        let plan = reconcile(&catalog, existing, &layout);
        assert_eq!(plan.unmapped.len(), 1);
        assert_eq!(plan.unmapped[0].path(), "Placeholders/readme.txt");
        assert_eq!(plan.to_delete, BTreeSet::from(["Placeholders/a-0.png".to_string()]));
    }

    #[test]
    fn test_reconcile_is_minimal() {
        let layout = layout();
        let entries: Vec<(String, bool)> = (0..40)
            .map(|i| (format!("Textures/t{}.png", i), i % 3 == 0))
            .collect();
        let refs: Vec<(&str, bool)> = entries.iter().map(|(n, u)| (n.as_str(), *u)).collect();
        let catalog = catalog(&refs);

        // Every other asset already has a file, plus a few orphans
        let mut existing: Vec<String> = entries
            .iter()
            .step_by(2)
            .map(|(name, _)| layout.forward(name))
            .collect();
        existing.push(layout.forward("Textures/orphan.png"));

        let plan = reconcile(&catalog, existing.iter().map(String::as_str), &layout);
        for name in &plan.to_create {
            assert!(catalog.get(name).unwrap().payload.use_placeholder);
            assert!(!existing.contains(&layout.forward(name)));
        }
        for path in &plan.to_delete {
            let name = layout.inverse(path).unwrap();
            let wanted = catalog.get(&name).map(|item| item.payload.use_placeholder);
            assert_ne!(wanted, Some(true));
        }
        assert!(plan.to_delete.contains(&layout.forward("Textures/orphan.png")));

        // Applying the plan leaves nothing to do
        let mut after: HashSet<String> = existing.iter().cloned().collect();
        after.retain(|path| !plan.to_delete.contains(path));
        after.extend(plan.to_create.iter().map(|name| layout.forward(name)));
        let again = reconcile(&catalog, after.iter().map(String::as_str), &layout);
        assert!(again.is_empty());
    }

    struct CopyWriter<'a> {
        fs: &'a InMemoryFs,
        fail_on: Option<&'a str>,
        calls: RefCell<Vec<String>>,
    }

    impl PlaceholderWriter for CopyWriter<'_> {
        fn write_placeholder(&self, asset_name: &str, placeholder_path: &str) -> Result<(), String> {
            self.calls.borrow_mut().push(asset_name.to_string());
            if self.fail_on == Some(asset_name) {
                return Err("unsupported format".to_string());
            }
            let source = self.fs.read(asset_name).map_err(|e| e.to_string())?;
            self.fs
                .write(placeholder_path, &source)
                .map_err(|e| e.to_string())
        }
    }

    #[test]
    fn test_apply_plan_and_refresh() {
        let fs = InMemoryFs::new();
        let layout = layout();
        fs.write("tex/a.png", b"A").unwrap();
        fs.write("tex/c.png", b"C").unwrap();
        fs.write(&layout.forward("tex/b.png"), b"old").unwrap();

        let catalog = catalog(&[("tex/a.png", true), ("tex/b.png", false), ("tex/c.png", true)]);
        let existing = crate::fs::walk_files(&fs, layout.root()).unwrap();
        let plan = reconcile(&catalog, existing.iter().map(String::as_str), &layout);

        let writer = CopyWriter {
            fs: &fs,
            fail_on: Some("tex/c.png"),
            calls: RefCell::new(Vec::new()),
        };
        let report = apply_plan(&plan, &layout, &fs, &writer);

        assert_eq!(report.deleted, vec![layout.forward("tex/b.png")]);
        assert_eq!(report.created, vec![layout.forward("tex/a.png")]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, layout.forward("tex/c.png"));
        assert_eq!(*writer.calls.borrow(), vec!["tex/a.png", "tex/c.png"]);
        assert_eq!(fs.read(&layout.forward("tex/a.png")).unwrap(), b"A");
        assert!(!fs.exists(&layout.forward("tex/b.png")).unwrap());

        let present: HashSet<String> = crate::fs::walk_files(&fs, layout.root())
            .unwrap()
            .into_iter()
            .collect();
        let refreshed = refresh_placeholder_paths(catalog, &layout, &present);
        assert_eq!(
            refreshed.get("tex/a.png").unwrap().payload.placeholder_path,
            Some(layout.forward("tex/a.png"))
        );
        assert_eq!(refreshed.get("tex/b.png").unwrap().payload.placeholder_path, None);
        assert_eq!(refreshed.get("tex/c.png").unwrap().payload.placeholder_path, None);
    }
}
