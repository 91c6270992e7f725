//! Maintenance commands for the recipe fixtures and saved meal plans.
//!
//! ```bash
//! cargo run --bin repair -- check
//! cargo run --bin repair -- reassign-ids --dry-run
//! cargo run --bin repair -- match-images --images-dir static/images
//! cargo run --bin repair -- migrate-plans
//! ```

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use mealplanner::{
    catalog::Catalog,
    repair::{self, RecipeFile},
};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "repair", about = "Recipe fixture and meal plan maintenance")]
struct Cli {
    /// Directory holding breakfast.json, lunch.json and dinner.json
    #[arg(long, default_value = "data/recipes")]
    recipes_dir: PathBuf,

    /// Report what would change without writing anything
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drop repeated recipes (same id or same name) within each file
    Dedupe,
    /// Make recipe ids unique across the three files
    ReassignIds,
    /// Move image paths from one prefix to another
    RewriteImages {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Replace the file extension as well
        #[arg(long)]
        ext: Option<String>,
    },
    /// Point each recipe at the best matching file in the image directory
    MatchImages {
        #[arg(long, default_value = "static/images")]
        images_dir: PathBuf,
    },
    /// Report duplicate ids, duplicate names and missing images
    Check {
        #[arg(long, default_value = "static/images")]
        images_dir: PathBuf,
    },
    /// Rewrite saved plans that still reference recipes by name only
    MigratePlans {
        #[arg(long)]
        database_url: Option<String>,
    },
}

fn save(files: &[RecipeFile], dry_run: bool) -> anyhow::Result<()> {
    if dry_run {
        info!("dry run, nothing written");
        return Ok(());
    }
    for file in files {
        repair::write_recipes(&file.path, &file.recipes)?;
    }
    Ok(())
}

fn dedupe(dir: &Path, dry_run: bool) -> anyhow::Result<()> {
    let mut files = repair::load_files(dir)?;
    let mut total = 0;
    for file in &mut files {
        let deduped = repair::dedupe(std::mem::take(&mut file.recipes));
        for r in &deduped.removed {
            info!(file = %file.meal_type, id = %r.id, name = %r.name, "duplicate removed");
        }
        total += deduped.removed.len();
        file.recipes = deduped.kept;
    }
    info!(removed = total, "dedupe finished");
    if total > 0 {
        save(&files, dry_run)?;
    }
    Ok(())
}

fn reassign_ids(dir: &Path, dry_run: bool) -> anyhow::Result<()> {
    let mut files = repair::load_files(dir)?;
    let changes = repair::reassign_ids(&mut files);
    for c in &changes {
        info!(file = %c.file, old = %c.old, new = %c.new, "id reassigned");
    }
    info!(changed = changes.len(), "reassign-ids finished");
    if !changes.is_empty() {
        save(&files, dry_run)?;
    }
    Ok(())
}

fn rewrite_images(dir: &Path, from: &str, to: &str, ext: Option<&str>, dry_run: bool) -> anyhow::Result<()> {
    let mut files = repair::load_files(dir)?;
    let changed: usize = files
        .iter_mut()
        .map(|f| repair::rewrite_images(&mut f.recipes, from, to, ext))
        .sum();
    info!(changed, "rewrite-images finished");
    if changed > 0 {
        save(&files, dry_run)?;
    }
    Ok(())
}

fn match_images(dir: &Path, images_dir: &Path, dry_run: bool) -> anyhow::Result<()> {
    let mut files = repair::load_files(dir)?;
    let candidates = repair::list_image_files(images_dir)?;
    let mut matched = 0;
    for file in &mut files {
        let report = repair::match_images(&mut file.recipes, &candidates);
        for id in &report.unmatched {
            warn!(file = %file.meal_type, id = %id, "no image matched");
        }
        matched += report.matched;
    }
    info!(matched, images = candidates.len(), "match-images finished");
    save(&files, dry_run)
}

fn check(dir: &Path, images_dir: &Path) -> anyhow::Result<bool> {
    let files = repair::load_files(dir)?;
    let violations = repair::check(&files, images_dir);
    for v in &violations {
        println!("{v}");
    }
    let recipes: usize = files.iter().map(|f| f.recipes.len()).sum();
    info!(recipes, violations = violations.len(), "check finished");
    Ok(violations.is_empty())
}

async fn migrate_plans(dir: &Path, database_url: Option<String>, dry_run: bool) -> anyhow::Result<()> {
    let url = match database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
    };
    let catalog = Catalog::load(dir)?;
    let db = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .context("connect to database")?;

    let report = repair::migrate_plans(&db, &catalog, dry_run).await?;
    for (id, reason) in &report.failed {
        warn!(plan_id = %id, %reason, "plan left unchanged");
    }
    info!(
        scanned = report.scanned,
        migrated = report.migrated,
        failed = report.failed.len(),
        dry_run,
        "migrate-plans finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "mealplanner=info,repair=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let dir = cli.recipes_dir.as_path();
    match cli.command {
        Command::Dedupe => dedupe(dir, cli.dry_run)?,
        Command::ReassignIds => reassign_ids(dir, cli.dry_run)?,
        Command::RewriteImages { from, to, ext } => {
            rewrite_images(dir, &from, &to, ext.as_deref(), cli.dry_run)?
        }
        Command::MatchImages { images_dir } => match_images(dir, &images_dir, cli.dry_run)?,
        Command::Check { images_dir } => {
            if !check(dir, &images_dir)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::MigratePlans { database_url } => migrate_plans(dir, database_url, cli.dry_run).await?,
    }
    Ok(ExitCode::SUCCESS)
}
