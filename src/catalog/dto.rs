use serde::{Deserialize, Serialize};

use super::Recipe;

pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RecipeListQuery {
    pub meal_type: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}
fn default_limit() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct RandomQuery {
    pub meal_type: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
    pub meal_type: String,
}

/// One page of the recipe book.
#[derive(Debug, Serialize)]
pub struct RecipePage {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub items: Vec<Recipe>,
}
