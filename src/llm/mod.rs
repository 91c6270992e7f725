pub mod client;
pub mod handlers;
pub mod prompt;

use crate::state::AppState;
use axum::Router;
use thiserror::Error;

pub use client::{LlmClient, OpenAiClient};
pub use prompt::{parse_meal_plan, MealSuggestion, SuggestedPlan, SuggestionRequest};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid response from model: {0}")]
    Parse(String),
}

pub fn router() -> Router<AppState> {
    handlers::ai_routes()
}
