use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use super::repo::{self, Rating, RecipeFeedback};
use crate::{auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub rating: Rating,
}

pub fn feedback_routes() -> Router<AppState> {
    Router::new()
        .route("/feedback", get(list_feedback))
        .route("/recipes/:id/feedback", put(rate_recipe).delete(clear_feedback))
}

/// PUT /recipes/:id/feedback { rating }
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn rate_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(recipe_id): Path<String>,
    Json(body): Json<FeedbackRequest>,
) -> Result<Json<RecipeFeedback>, (StatusCode, String)> {
    if state.catalog.find_by_id(&recipe_id).is_none() {
        warn!(%recipe_id, "feedback for unknown recipe");
        return Err((StatusCode::NOT_FOUND, "Recipe not found".into()));
    }
    let row = repo::upsert(&state.db, user.id, &recipe_id, body.rating)
        .await
        .map_err(|e| {
            error!(error = %e, %recipe_id, "feedback upsert failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    info!(%recipe_id, rating = ?row.rating, "feedback stored");
    Ok(Json(row))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_feedback(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<RecipeFeedback>>, (StatusCode, String)> {
    repo::list_by_user(&state.db, user.id)
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(recipe_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    match repo::delete(&state.db, user.id, &recipe_id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err((StatusCode::NOT_FOUND, "No feedback for recipe".into())),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
