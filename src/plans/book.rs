use serde::Serialize;

use super::{planner::resolve, DayPlan, MealRef};
use crate::catalog::{Catalog, MealType, Recipe};

#[derive(Debug, Serialize)]
pub struct BookEntry {
    pub meal_type: MealType,
    pub reference: MealRef,
    /// `None` when the slot no longer matches any catalog recipe.
    pub recipe: Option<Recipe>,
}

/// One day of a saved plan with its recipes resolved.
#[derive(Debug, Serialize)]
pub struct BookPage {
    pub page: usize,
    pub total_pages: usize,
    pub day: String,
    pub meals: Vec<BookEntry>,
}

/// `page` is 1-based; out-of-range pages yield `None`.
pub fn book_page(catalog: &Catalog, week: &[DayPlan], page: usize) -> Option<BookPage> {
    let day = week.get(page.checked_sub(1)?)?;
    let meals = day
        .slots()
        .into_iter()
        .map(|(meal_type, meal_ref)| BookEntry {
            meal_type,
            reference: meal_ref.clone(),
            recipe: resolve(catalog, meal_ref, meal_type).cloned(),
        })
        .collect();
    Some(BookPage {
        page,
        total_pages: week.len(),
        day: day.day.clone(),
        meals,
    })
}
