//! Static recipe catalog: three fixture files partitioned into meal-type
//! buckets, with the lookups plan assembly and the recipe book need.

mod dto;
pub mod handlers;
mod store;
mod types;

use axum::Router;
use thiserror::Error;

use crate::state::AppState;

pub use store::{read_recipe_file, Catalog, SOURCE_FILES};
pub use types::{Ingredient, MealType, Recipe};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown meal type '{0}'")]
    UnknownMealType(String),
}

pub fn router() -> Router<AppState> {
    handlers::recipe_routes()
}
