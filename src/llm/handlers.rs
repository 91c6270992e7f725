use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{error, info, instrument};

use super::prompt::{build_messages, parse_meal_plan, SuggestedPlan, SuggestionRequest};
use crate::{auth::AuthUser, profiles::handlers::MAX_SERVINGS, state::AppState};

pub fn ai_routes() -> Router<AppState> {
    Router::new().route("/ai/meal-plan", post(suggest_meal_plan))
}

/// POST /ai/meal-plan { dietary_preference, budget_tier, servings }
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn suggest_meal_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SuggestionRequest>,
) -> Result<Json<SuggestedPlan>, (StatusCode, String)> {
    if req.servings == 0 || req.servings > MAX_SERVINGS as u32 {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("servings must be between 1 and {MAX_SERVINGS}"),
        ));
    }

    let messages = build_messages(&req);
    let raw = state.llm.complete(&messages).await.map_err(|e| {
        error!(error = %e, "completion request failed");
        (StatusCode::BAD_GATEWAY, e.to_string())
    })?;

    let plan = parse_meal_plan(&raw).map_err(|e| {
        error!(error = %e, "model reply rejected");
        (StatusCode::BAD_GATEWAY, e.to_string())
    })?;
    info!(meals = plan.meals.len(), "ai meal plan generated");
    Ok(Json(plan))
}
