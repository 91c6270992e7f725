//! Offline maintenance for the recipe fixtures and for saved plans that
//! predate id-based slots. Driven by the `repair` binary.

mod check;
mod dedupe;
mod files;
mod ids;
mod images;
mod migrate;

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::CatalogError;

pub use check::{check, Violation};
pub use dedupe::{dedupe, Deduped};
pub use files::{load_files, write_recipes, RecipeFile};
pub use ids::{reassign_ids, IdChange};
pub use images::{
    best_image, image_file_path, list_image_files, match_images, normalize, rewrite_images,
    MatchReport, RECIPE_IMAGE_DIR,
};
pub use migrate::{migrate_plans, plan_migration, MigrationReport};

#[derive(Debug, Error)]
pub enum RepairError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
