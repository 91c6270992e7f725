use std::collections::{HashMap, HashSet};

use super::files::RecipeFile;
use crate::catalog::MealType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdChange {
    pub file: MealType,
    pub old: String,
    pub new: String,
}

fn numeric_suffix(id: &str, prefix: &str) -> Option<u32> {
    id.strip_prefix(prefix)?.parse().ok()
}

/// Makes ids unique across all files. Files are walked in order; the first
/// holder of an id keeps it and later holders get `<prefix><n>` with the next
/// number not yet used for their file's prefix.
pub fn reassign_ids(files: &mut [RecipeFile]) -> Vec<IdChange> {
    let mut taken: HashSet<String> = files
        .iter()
        .flat_map(|f| f.recipes.iter().map(|r| r.id.clone()))
        .collect();
    let mut next: HashMap<&'static str, u32> = HashMap::new();
    let mut seen = HashSet::new();
    let mut changes = Vec::new();

    for file in files.iter_mut() {
        let prefix = file.id_prefix();
        let meal_type = file.meal_type;
        for recipe in file.recipes.iter_mut() {
            if seen.insert(recipe.id.clone()) {
                continue;
            }
            let n = next.entry(prefix).or_insert_with(|| {
                taken
                    .iter()
                    .filter_map(|id| numeric_suffix(id, prefix))
                    .max()
                    .unwrap_or(0)
                    + 1
            });
            let mut candidate = format!("{prefix}{n}");
            while taken.contains(&candidate) {
                *n += 1;
                candidate = format!("{prefix}{n}");
            }
            *n += 1;

            taken.insert(candidate.clone());
            seen.insert(candidate.clone());
            changes.push(IdChange {
                file: meal_type,
                old: std::mem::replace(&mut recipe.id, candidate.clone()),
                new: candidate,
            });
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::catalog::test_support::recipe;

    fn file(meal_type: MealType, ids: &[&str]) -> RecipeFile {
        RecipeFile {
            path: PathBuf::from(format!("{meal_type}.json")),
            meal_type,
            recipes: ids
                .iter()
                .map(|id| recipe(id, &format!("Recipe {id}"), meal_type, &["salt"]))
                .collect(),
        }
    }

    #[test]
    fn ids_unique_after_reassignment() {
        let mut files = vec![
            file(MealType::Breakfast, &["b1", "b2", "b2"]),
            file(MealType::Lunch, &["b1", "l1", "l2"]),
            file(MealType::Dinner, &["d1", "l2", "d1"]),
        ];
        let changes = reassign_ids(&mut files);

        let all: Vec<&str> = files
            .iter()
            .flat_map(|f| f.recipes.iter().map(|r| r.id.as_str()))
            .collect();
        let unique: HashSet<&str> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len());
        assert_eq!(changes.len(), 4);

        assert_eq!(
            changes[0],
            IdChange {
                file: MealType::Breakfast,
                old: "b2".into(),
                new: "b3".into()
            }
        );
        assert_eq!(files[1].recipes[0].id, "l3");
        assert_eq!(files[2].recipes[1].id, "d2");
        assert_eq!(files[2].recipes[2].id, "d3");
    }

    #[test]
    fn leaves_unique_ids_alone() {
        let mut files = vec![
            file(MealType::Breakfast, &["b1"]),
            file(MealType::Lunch, &["l1"]),
            file(MealType::Dinner, &["d1"]),
        ];
        assert!(reassign_ids(&mut files).is_empty());
    }
}
