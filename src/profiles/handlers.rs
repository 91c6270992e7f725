use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use super::{
    repo::{self, Preferences},
    repo_types::{BudgetTier, Profile},
};
use crate::{auth::AuthUser, state::AppState};

pub const MAX_SERVINGS: i32 = 12;

#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    pub dietary_preference: Option<String>,
    pub budget_tier: Option<BudgetTier>,
    pub servings: i32,
    #[serde(default)]
    pub allergies: Vec<String>,
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/preferences", put(update_preferences))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Profile>, (StatusCode, String)> {
    let profile = repo::ensure(&state.db, user.id, user.email.as_deref())
        .await
        .map_err(|e| {
            error!(error = %e, "load profile failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    Ok(Json(profile))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update_preferences(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<PreferencesRequest>,
) -> Result<Json<Profile>, (StatusCode, String)> {
    if !(1..=MAX_SERVINGS).contains(&body.servings) {
        warn!(servings = body.servings, "servings out of range");
        return Err((
            StatusCode::BAD_REQUEST,
            format!("servings must be between 1 and {MAX_SERVINGS}"),
        ));
    }

    let internal = |e: anyhow::Error| {
        error!(error = %e, "update preferences failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    };
    repo::ensure(&state.db, user.id, user.email.as_deref())
        .await
        .map_err(internal)?;

    let allergies: Vec<String> = body
        .allergies
        .iter()
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect();
    let prefs = Preferences {
        dietary_preference: body.dietary_preference.as_deref().map(str::trim),
        budget_tier: body.budget_tier.map(BudgetTier::as_str),
        servings: body.servings,
        allergies: &allergies,
    };
    let profile = repo::update_preferences(&state.db, user.id, &prefs)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Profile not found".into()))?;
    info!("preferences updated");
    Ok(Json(profile))
}
