use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::PlanError;
use crate::catalog::{Catalog, MealType, Recipe};

/// Draws per slot before a repeat is accepted.
pub const MAX_DRAW_ATTEMPTS: usize = 5;

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Reference from a plan slot to a catalog recipe.
///
/// Older plans stored only the recipe name as a bare string; both shapes
/// deserialize, and `id` is `None` for the legacy one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "MealRefRepr")]
pub struct MealRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MealRefRepr {
    Name(String),
    Full {
        #[serde(default)]
        id: Option<String>,
        name: String,
    },
}

impl From<MealRefRepr> for MealRef {
    fn from(repr: MealRefRepr) -> Self {
        match repr {
            MealRefRepr::Name(name) => MealRef { id: None, name },
            MealRefRepr::Full { id, name } => MealRef { id, name },
        }
    }
}

impl From<&Recipe> for MealRef {
    fn from(recipe: &Recipe) -> Self {
        MealRef {
            id: Some(recipe.id.clone()),
            name: recipe.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayPlan {
    pub day: String,
    pub breakfast: MealRef,
    pub lunch: MealRef,
    pub dinner: MealRef,
}

impl DayPlan {
    pub fn slots(&self) -> [(MealType, &MealRef); 3] {
        [
            (MealType::Breakfast, &self.breakfast),
            (MealType::Lunch, &self.lunch),
            (MealType::Dinner, &self.dinner),
        ]
    }

    pub fn is_canonical(&self) -> bool {
        self.slots().iter().all(|(_, r)| r.id.is_some())
    }
}

/// A week together with the values derived from the recipes placed in it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssembledPlan {
    pub week: Vec<DayPlan>,
    pub shopping_list: Vec<String>,
    pub estimated_cost: f64,
}

impl AssembledPlan {
    fn from_parts(week: Vec<DayPlan>, placed: &[&Recipe]) -> Self {
        Self {
            week,
            shopping_list: shopping_list(placed.iter().copied()),
            estimated_cost: placed.iter().map(|r| r.total_cost).sum(),
        }
    }
}

fn draw<'c, R: Rng + ?Sized>(
    catalog: &'c Catalog,
    meal_type: MealType,
    used: &HashSet<&str>,
    rng: &mut R,
) -> Result<&'c Recipe, PlanError> {
    let mut attempts = 0;
    loop {
        let pick = catalog
            .random_recipe(meal_type, rng)
            .ok_or(PlanError::EmptyBucket(meal_type))?;
        attempts += 1;
        if !used.contains(pick.id.as_str()) {
            return Ok(pick);
        }
        if attempts >= MAX_DRAW_ATTEMPTS {
            debug!(id = %pick.id, %meal_type, "draw budget spent; accepting repeat");
            return Ok(pick);
        }
    }
}

/// Builds a Monday..Sunday plan, one random recipe per slot, avoiding
/// repeats on a best-effort basis.
pub fn generate_week<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> Result<AssembledPlan, PlanError> {
    let mut used: HashSet<&str> = HashSet::new();
    let mut placed: Vec<&Recipe> = Vec::with_capacity(WEEKDAYS.len() * MealType::PLAN_SLOTS.len());
    let mut week = Vec::with_capacity(WEEKDAYS.len());

    for day in WEEKDAYS {
        let mut pick = |slot: MealType| -> Result<MealRef, PlanError> {
            let recipe = draw(catalog, slot, &used, rng)?;
            used.insert(recipe.id.as_str());
            placed.push(recipe);
            Ok(MealRef::from(recipe))
        };
        week.push(DayPlan {
            day: day.to_string(),
            breakfast: pick(MealType::Breakfast)?,
            lunch: pick(MealType::Lunch)?,
            dinner: pick(MealType::Dinner)?,
        });
    }

    Ok(AssembledPlan::from_parts(week, &placed))
}

/// Deduplicated union of ingredient names, in order of first appearance.
pub fn shopping_list<'r>(recipes: impl IntoIterator<Item = &'r Recipe>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut list = Vec::new();
    for recipe in recipes {
        for item in recipe.ingredient_names() {
            if seen.insert(item) {
                list.push(item.to_string());
            }
        }
    }
    list
}

/// Looks a slot up by id first, then by name within the slot's bucket.
pub fn resolve<'c>(catalog: &'c Catalog, meal_ref: &MealRef, meal_type: MealType) -> Option<&'c Recipe> {
    meal_ref
        .id
        .as_deref()
        .and_then(|id| catalog.find_by_id(id))
        .or_else(|| catalog.find_recipe_by_name(&meal_ref.name, meal_type))
}

/// Canonicalizes every slot of a client- or database-supplied week and
/// recomputes the shopping list and cost from the catalog.
pub fn assemble_week(catalog: &Catalog, week: Vec<DayPlan>) -> Result<AssembledPlan, PlanError> {
    if week.len() != WEEKDAYS.len() {
        return Err(PlanError::WrongDayCount(week.len()));
    }
    let mut placed = Vec::with_capacity(week.len() * 3);
    let mut canonical = Vec::with_capacity(week.len());
    for day in week {
        let mut canonicalize = |meal_type: MealType, meal_ref: &MealRef| -> Result<MealRef, PlanError> {
            let recipe = resolve(catalog, meal_ref, meal_type).ok_or_else(|| PlanError::Unresolved {
                day: day.day.clone(),
                meal_type,
                name: meal_ref.name.clone(),
            })?;
            placed.push(recipe);
            Ok(MealRef::from(recipe))
        };
        let breakfast = canonicalize(MealType::Breakfast, &day.breakfast)?;
        let lunch = canonicalize(MealType::Lunch, &day.lunch)?;
        let dinner = canonicalize(MealType::Dinner, &day.dinner)?;
        canonical.push(DayPlan {
            day: day.day,
            breakfast,
            lunch,
            dinner,
        });
    }
    Ok(AssembledPlan::from_parts(canonical, &placed))
}
