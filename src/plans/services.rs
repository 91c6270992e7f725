use axum::http::StatusCode;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{assemble_week, generate_week, repo, repo_types::MealPlanRow, DayPlan, PlanError};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum PlanServiceError {
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

impl From<PlanServiceError> for (StatusCode, String) {
    fn from(e: PlanServiceError) -> Self {
        match e {
            PlanServiceError::Plan(PlanError::EmptyBucket(meal_type)) => {
                error!(%meal_type, "catalog bucket empty");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("no {meal_type} recipes available"),
                )
            }
            PlanServiceError::Plan(e) => {
                warn!(error = %e, "rejected meal plan");
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            PlanServiceError::Db(e) => {
                error!(error = %e, "meal plan storage failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

pub async fn generate_and_store(st: &AppState, user_id: Uuid) -> Result<MealPlanRow, PlanServiceError> {
    // ThreadRng must not live across the await below.
    let plan = {
        let mut rng = rand::thread_rng();
        generate_week(&st.catalog, &mut rng)?
    };
    let row = repo::insert(&st.db, user_id, &plan).await?;
    info!(%user_id, plan_id = %row.id, items = row.shopping_list.len(), "meal plan generated");
    Ok(row)
}

pub async fn save_week(st: &AppState, user_id: Uuid, week: Vec<DayPlan>) -> Result<MealPlanRow, PlanServiceError> {
    let plan = assemble_week(&st.catalog, week)?;
    let row = repo::insert(&st.db, user_id, &plan).await?;
    info!(%user_id, plan_id = %row.id, "meal plan saved");
    Ok(row)
}

pub async fn replace_week(
    st: &AppState,
    user_id: Uuid,
    plan_id: Uuid,
    week: Vec<DayPlan>,
) -> Result<Option<MealPlanRow>, PlanServiceError> {
    let plan = assemble_week(&st.catalog, week)?;
    Ok(repo::update(&st.db, user_id, plan_id, &plan).await?)
}
