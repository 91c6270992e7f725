use serde::{Deserialize, Serialize};

use super::{client::ChatMessage, LlmError};
use crate::profiles::BudgetTier;

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionRequest {
    pub dietary_preference: Option<String>,
    pub budget_tier: BudgetTier,
    pub servings: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSuggestion {
    pub day: String,
    pub meal: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedPlan {
    pub meals: Vec<MealSuggestion>,
}

const SYSTEM_PROMPT: &str = "You are a meal planning assistant. Reply with a single JSON object \
of the form {\"meals\": [{\"day\": string, \"meal\": string, \"ingredients\": [string], \
\"instructions\": [string]}]} and nothing else.";

fn budget_hint(tier: BudgetTier) -> &'static str {
    match tier {
        BudgetTier::Low => "a tight budget, favouring cheap staples",
        BudgetTier::Medium => "a moderate budget",
        BudgetTier::High => "a generous budget, premium ingredients are fine",
    }
}

pub fn build_messages(req: &SuggestionRequest) -> Vec<ChatMessage> {
    let diet = req
        .dietary_preference
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("no particular");
    let user = format!(
        "Plan breakfast, lunch and dinner for each day Monday to Sunday. \
         Dietary preference: {diet}. Budget: {}. Each meal should serve {} people. \
         List every ingredient with its quantity and give the instructions as short steps.",
        budget_hint(req.budget_tier),
        req.servings,
    );
    vec![
        ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user",
            content: user,
        },
    ]
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag on the opening fence line
    let body = rest.split_once('\n').map_or("", |(_, b)| b);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parses the model reply. Only a surrounding code fence is tolerated; any
/// other deviation from the expected shape is an error.
pub fn parse_meal_plan(raw: &str) -> Result<SuggestedPlan, LlmError> {
    let plan: SuggestedPlan = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| LlmError::Parse(e.to_string()))?;
    if plan.meals.is_empty() {
        return Err(LlmError::Parse("no meals in response".to_string()));
    }
    Ok(plan)
}
