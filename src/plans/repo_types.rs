use serde::Serialize;
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use super::DayPlan;

/// Saved meal plan row.
#[derive(Debug, Clone, FromRow)]
pub struct MealPlanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week: Json<Vec<DayPlan>>,
    pub shopping_list: Vec<String>,
    pub estimated_cost: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct MealPlan {
    pub id: Uuid,
    pub week: Vec<DayPlan>,
    pub shopping_list: Vec<String>,
    pub estimated_cost: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<MealPlanRow> for MealPlan {
    fn from(r: MealPlanRow) -> Self {
        Self {
            id: r.id,
            week: r.week.0,
            shopping_list: r.shopping_list,
            estimated_cost: r.estimated_cost,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
