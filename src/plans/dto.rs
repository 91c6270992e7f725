use serde::Deserialize;

use super::DayPlan;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

/// Body for saving or replacing a week.
#[derive(Debug, Deserialize)]
pub struct SaveMealPlanRequest {
    pub week: Vec<DayPlan>,
}

#[derive(Debug, Deserialize)]
pub struct BookQuery {
    #[serde(default = "default_page")]
    pub page: usize,
}
fn default_page() -> usize {
    1
}
