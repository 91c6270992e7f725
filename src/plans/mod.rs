//! Weekly meal plans: random assembly from the catalog, persistence per
//! user, and the paginated recipe-book view.

pub mod book;
mod dto;
pub mod handlers;
pub mod planner;
pub mod repo;
pub mod repo_types;
mod services;

use axum::Router;
use thiserror::Error;

use crate::{catalog::MealType, state::AppState};

pub use planner::{assemble_week, generate_week, shopping_list, AssembledPlan, DayPlan, MealRef};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no {0} recipes in the catalog")]
    EmptyBucket(MealType),
    #[error("a plan needs exactly 7 days, got {0}")]
    WrongDayCount(usize),
    #[error("{day}: no {meal_type} recipe matches '{name}'")]
    Unresolved {
        day: String,
        meal_type: MealType,
        name: String,
    },
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
