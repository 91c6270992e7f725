use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{
    book::{book_page, BookPage},
    dto::{BookQuery, Pagination, SaveMealPlanRequest},
    repo,
    repo_types::{MealPlan, MealPlanRow},
    services::{generate_and_store, replace_week, save_week},
};
use crate::{auth::AuthUser, state::AppState};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meal-plans", get(list_plans))
        .route("/meal-plans/latest", get(latest_plan))
        .route("/meal-plans/:id", get(get_plan))
        .route("/meal-plans/:id/book", get(get_book_page))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meal-plans", post(create_plan))
        .route("/meal-plans/generate", post(generate_plan))
        .route("/meal-plans/:id", axum::routing::put(update_plan).delete(delete_plan))
}

// --- handlers ---

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_plans(
    State(state): State<AppState>,
    user: AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<MealPlan>>, (StatusCode, String)> {
    let rows = repo::list_by_user(&state.db, user.id, p.limit.clamp(1, 100), p.offset.max(0))
        .await
        .map_err(internal)?;
    Ok(Json(rows.into_iter().map(MealPlan::from).collect()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn latest_plan(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MealPlan>, (StatusCode, String)> {
    repo::latest_for_user(&state.db, user.id)
        .await
        .map_err(internal)?
        .map(|row| Json(row.into()))
        .ok_or((StatusCode::NOT_FOUND, "No meal plan yet".into()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MealPlan>, (StatusCode, String)> {
    owned_plan(&state, user.id, id).await.map(|row| Json(row.into()))
}

/// GET /meal-plans/:id/book?page=N — one page per day.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_book_page(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<BookQuery>,
) -> Result<Json<BookPage>, (StatusCode, String)> {
    let row = owned_plan(&state, user.id, id).await?;
    book_page(&state.catalog, &row.week.0, q.page)
        .map(Json)
        .ok_or((
            StatusCode::NOT_FOUND,
            format!("page {} out of range 1..={}", q.page, row.week.0.len()),
        ))
}

/// POST /meal-plans/generate — assemble a fresh random week and store it.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn generate_plan(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, HeaderMap, Json<MealPlan>), (StatusCode, String)> {
    let row = generate_and_store(&state, user.id).await?;
    Ok(created(row))
}

/// POST /meal-plans { week: [...] }
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<SaveMealPlanRequest>,
) -> Result<(StatusCode, HeaderMap, Json<MealPlan>), (StatusCode, String)> {
    let row = save_week(&state, user.id, body.week).await?;
    Ok(created(row))
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SaveMealPlanRequest>,
) -> Result<Json<MealPlan>, (StatusCode, String)> {
    match replace_week(&state, user.id, id, body.week).await? {
        Some(row) => {
            info!(plan_id = %id, "meal plan updated");
            Ok(Json(row.into()))
        }
        None => Err((StatusCode::NOT_FOUND, "Meal plan not found".into())),
    }
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if repo::delete(&state.db, user.id, id).await.map_err(internal)? {
        info!(plan_id = %id, "meal plan deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Meal plan not found".into()))
    }
}

async fn owned_plan(st: &AppState, user_id: Uuid, id: Uuid) -> Result<MealPlanRow, (StatusCode, String)> {
    match repo::get(&st.db, user_id, id).await {
        Ok(Some(row)) => Ok(row),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Meal plan not found".into())),
        Err(e) => {
            error!(error = %e, %user_id, %id, "get meal plan failed");
            Err(internal(e))
        }
    }
}

fn created(row: MealPlanRow) -> (StatusCode, HeaderMap, Json<MealPlan>) {
    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/meal-plans/{}", row.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    (StatusCode::CREATED, headers, Json(row.into()))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
