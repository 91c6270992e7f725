use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Logical bucket a recipe belongs to for plan assembly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    /// Slots filled for every day of a weekly plan.
    pub const PLAN_SLOTS: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = super::CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" | "snacks" => Ok(MealType::Snack),
            other => Err(super::CatalogError::UnknownMealType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub item: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub allergens: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub meal_type: MealType,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub total_cost: f64,
}

fn default_servings() -> u32 {
    2
}

impl Recipe {
    pub fn ingredient_names(&self) -> impl Iterator<Item = &str> {
        self.ingredients.iter().map(|i| i.item.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_meal_type_case_insensitively() {
        assert_eq!("Breakfast".parse::<MealType>().unwrap(), MealType::Breakfast);
        assert_eq!(" dinner ".parse::<MealType>().unwrap(), MealType::Dinner);
        assert_eq!("snacks".parse::<MealType>().unwrap(), MealType::Snack);
        assert!("brunch".parse::<MealType>().is_err());
    }

    #[test]
    fn recipe_reads_camel_case_fixture_fields() {
        let json = r#"{
            "id": "b1",
            "name": "Overnight Oats",
            "mealType": "breakfast",
            "servings": 1,
            "ingredients": [{"item": "rolled oats", "amount": "1/2 cup", "cost": 0.3, "allergens": ["gluten"]}],
            "instructions": ["Mix", "Chill"],
            "image": "/images/recipes/overnight-oats.jpg",
            "tags": ["quick"],
            "totalCost": 1.85,
            "legacyField": true
        }"#;
        let recipe: Recipe = serde_json::from_str(json).expect("recipe parses");
        assert_eq!(recipe.meal_type, MealType::Breakfast);
        assert_eq!(recipe.total_cost, 1.85);
        assert_eq!(recipe.ingredients[0].allergens, vec!["gluten"]);
        assert_eq!(recipe.ingredient_names().collect::<Vec<_>>(), vec!["rolled oats"]);
    }
}
