//! asset-streamer: keeps texture and scene catalogs in sync with a project's
//! dependency graph and manages placeholder substitutes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use streamer_cli::config::resolve_project_root;
use streamer_cli::{Project, TreeQuery, parse_sort};
use streamer_core::catalog::format_bytes;
use streamer_core::{SceneColumn, TextureColumn};

#[derive(Parser, Debug)]
#[command(name = "asset-streamer")]
#[command(about = "Texture streaming catalogs and placeholders")]
struct Args {
    /// Project root (defaults to $STREAMER_PROJECT, then the current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild the texture and scene catalogs
    Sync,
    /// Create and delete placeholder files to match the catalog
    Placeholders {
        /// Print the plan without touching any file
        #[arg(long)]
        dry_run: bool,
    },
    /// Build asset bundles with the configured build command
    Bundles {
        #[command(subcommand)]
        target: BundleTarget,
    },
    /// Summarize both catalogs
    Status,
    /// Mark textures for placeholder substitution
    Mark {
        names: Vec<String>,
        /// Clear the mark instead of setting it
        #[arg(long)]
        clear: bool,
    },
    /// Print a catalog as rows
    Tree {
        /// Show the scene catalog instead of textures
        #[arg(long)]
        scenes: bool,
        /// Only rows whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Sort columns, e.g. `memory:desc,path`
        #[arg(long, default_value = "")]
        sort: String,
        /// Expand every row that has children
        #[arg(long)]
        expand: bool,
    },
    /// Reparent textures
    Move {
        /// New parent (texture name, or `Root`)
        parent: String,
        /// Insertion index among the parent's children
        index: usize,
        names: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum BundleTarget {
    /// One bundle per placeholder texture
    Textures,
    /// Placeholder bundle, scene bundles and the scene lookup table
    Scenes {
        /// Rebuild even if the build tool thinks bundles are current
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging - respects RUST_LOG env var, defaults to info (or debug with --verbose)
    let default_filter = if args.verbose {
        "debug,streamer_core=debug,streamer_cli=debug"
    } else {
        "info,streamer_core=info,streamer_cli=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let root = resolve_project_root(args.project);
    info!("Project root: {:?}", root);
    let project = Project::open(root)?;

    match args.command {
        Commands::Sync => {
            let _lock = project.lock()?;
            let report = project.sync_textures()?;
            let scenes = project.sync_scenes()?;
            println!(
                "textures: {} kept, {} added, {} removed; scenes: {}",
                report.retained,
                report.added.len(),
                report.removed.len(),
                scenes.len()
            );
            for name in &report.uninspected {
                warn!("Could not read texture stats for {}", name);
            }
        }
        Commands::Placeholders { dry_run } => {
            let _lock = project.lock()?;
            let run = project.update_placeholders(dry_run)?;
            for name in &run.plan.to_create {
                println!("create {}", name);
            }
            for path in &run.plan.to_delete {
                println!("delete {}", path);
            }
            for unmapped in &run.plan.unmapped {
                println!("skip   {}", unmapped);
            }
            if let Some(applied) = run.applied {
                println!(
                    "{} created, {} deleted, {} failed",
                    applied.created.len(),
                    applied.deleted.len(),
                    applied.failures.len()
                );
                for failure in &applied.failures {
                    warn!("{}: {}", failure.path, failure.reason);
                }
            }
        }
        Commands::Bundles { target } => {
            let _lock = project.lock()?;
            let outcome = match target {
                BundleTarget::Textures => project.build_texture_bundles()?,
                BundleTarget::Scenes { force } => project.build_scene_bundles(force)?,
            };
            for path in &outcome.pruned {
                println!("pruned {}", path);
            }
            for path in &outcome.produced {
                println!("built  {}", path);
            }
        }
        Commands::Status => {
            let (textures, scenes) = project.status()?;
            println!("{}", textures);
            println!("{}", scenes);
            println!(
                "total bundles: {}",
                format_bytes(textures.placeholder_bundle_bytes + scenes.bundle_bytes)
            );
        }
        Commands::Mark { names, clear } => {
            let _lock = project.lock()?;
            for name in project.mark(&names, !clear)? {
                warn!("No texture named {}", name);
            }
        }
        Commands::Tree {
            scenes,
            search,
            sort,
            expand,
        } => {
            let lines = if scenes {
                let query = TreeQuery {
                    search,
                    sort: parse_sort::<SceneColumn>(&sort)?,
                    expand_all: expand,
                };
                project.scene_rows(&query)?
            } else {
                let query = TreeQuery {
                    search,
                    sort: parse_sort::<TextureColumn>(&sort)?,
                    expand_all: expand,
                };
                project.texture_rows(&query)?
            };
            for line in lines {
                println!("{}", line);
            }
        }
        Commands::Move {
            parent,
            index,
            names,
        } => {
            let _lock = project.lock()?;
            project.move_textures(&parent, index, &names)?;
        }
    }

    Ok(())
}
