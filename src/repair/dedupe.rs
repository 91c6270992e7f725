use std::collections::HashSet;

use super::images::normalize;
use crate::catalog::Recipe;

#[derive(Debug, Default)]
pub struct Deduped {
    pub kept: Vec<Recipe>,
    pub removed: Vec<Recipe>,
}

/// Drops every recipe whose id or normalized name was already seen earlier in
/// the same list. The first occurrence wins.
pub fn dedupe(recipes: Vec<Recipe>) -> Deduped {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    let mut out = Deduped::default();
    for recipe in recipes {
        let fresh_id = !ids.contains(&recipe.id);
        let fresh_name = !names.contains(&normalize(&recipe.name));
        if fresh_id && fresh_name {
            ids.insert(recipe.id.clone());
            names.insert(normalize(&recipe.name));
            out.kept.push(recipe);
        } else {
            out.removed.push(recipe);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{test_support::recipe, MealType};

    #[test]
    fn keeps_first_of_each_id_and_name() {
        let deduped = dedupe(vec![
            recipe("d1", "Chicken Stir-Fry", MealType::Dinner, &["chicken"]),
            recipe("d2", "chicken stir fry", MealType::Dinner, &["chicken"]),
            recipe("d1", "Beef Tacos", MealType::Dinner, &["beef"]),
            recipe("d3", "Veggie Curry", MealType::Dinner, &["chickpeas"]),
        ]);
        let kept: Vec<_> = deduped.kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(kept, ["d1", "d3"]);
        assert_eq!(deduped.kept[0].name, "Chicken Stir-Fry");
        assert_eq!(deduped.removed.len(), 2);
    }
}
