use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{RandomQuery, RecipeListQuery, RecipePage, SearchQuery, MAX_PAGE_SIZE},
    MealType, Recipe,
};
use crate::{auth::AuthUser, state::AppState};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/random", get(random_recipe))
        .route("/recipes/search", get(search_recipe))
        .route("/recipes/:id", get(get_recipe))
}

pub(crate) fn parse_meal_type(raw: &str) -> Result<MealType, (StatusCode, String)> {
    raw.parse::<MealType>().map_err(|e| {
        warn!(meal_type = %raw, "rejected meal type");
        (StatusCode::BAD_REQUEST, e.to_string())
    })
}

/// GET /recipes?meal_type=&limit=&offset=
#[instrument(skip(state, _user))]
pub async fn list_recipes(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<RecipeListQuery>,
) -> Result<Json<RecipePage>, (StatusCode, String)> {
    let recipes: Vec<&Recipe> = match q.meal_type.as_deref() {
        Some(raw) => state.catalog.recipes_by_meal_type(parse_meal_type(raw)?),
        None => state.catalog.all().iter().collect(),
    };
    let limit = q.limit.clamp(1, MAX_PAGE_SIZE);
    let items = recipes
        .iter()
        .skip(q.offset)
        .take(limit)
        .map(|r| (*r).clone())
        .collect();
    Ok(Json(RecipePage {
        total: recipes.len(),
        limit,
        offset: q.offset,
        items,
    }))
}

/// GET /recipes/random?meal_type=
#[instrument(skip(state, _user))]
pub async fn random_recipe(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<RandomQuery>,
) -> Result<Json<Recipe>, (StatusCode, String)> {
    let meal_type = parse_meal_type(&q.meal_type)?;
    let mut rng = rand::thread_rng();
    state
        .catalog
        .random_recipe(meal_type, &mut rng)
        .cloned()
        .map(Json)
        .ok_or((
            StatusCode::NOT_FOUND,
            format!("No {meal_type} recipes available"),
        ))
}

/// GET /recipes/search?name=&meal_type=
#[instrument(skip(state, _user))]
pub async fn search_recipe(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Recipe>, (StatusCode, String)> {
    let meal_type = parse_meal_type(&q.meal_type)?;
    state
        .catalog
        .find_recipe_by_name(&q.name, meal_type)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Recipe not found".into()))
}

#[instrument(skip(state, _user))]
pub async fn get_recipe(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, (StatusCode, String)> {
    state
        .catalog
        .find_by_id(&id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Recipe not found".into()))
}
