use std::{collections::BTreeMap, fmt, path::Path};

use super::{files::RecipeFile, images::image_file_path, normalize};
use crate::catalog::MealType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    DuplicateId { id: String, files: Vec<MealType> },
    DuplicateName { file: MealType, name: String },
    MissingImage { recipe_id: String, path: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicateId { id, files } => {
                let files: Vec<&str> = files.iter().map(|t| t.as_str()).collect();
                write!(f, "duplicate id {id} in {}", files.join(", "))
            }
            Violation::DuplicateName { file, name } => {
                write!(f, "duplicate name '{name}' in {file}")
            }
            Violation::MissingImage { recipe_id, path } => {
                write!(f, "recipe {recipe_id}: image {path} not found")
            }
        }
    }
}

/// Reports everything the runtime assumes about the fixtures but does not
/// enforce: globally unique ids, unique names per file, and image paths that
/// point at files in `images_dir`.
pub fn check(files: &[RecipeFile], images_dir: &Path) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut ids: BTreeMap<&str, Vec<MealType>> = BTreeMap::new();
    for file in files {
        for recipe in &file.recipes {
            ids.entry(recipe.id.as_str()).or_default().push(file.meal_type);
        }
    }
    violations.extend(
        ids.into_iter()
            .filter(|(_, holders)| holders.len() > 1)
            .map(|(id, files)| Violation::DuplicateId {
                id: id.to_string(),
                files,
            }),
    );

    for file in files {
        let mut names: BTreeMap<String, usize> = BTreeMap::new();
        for recipe in &file.recipes {
            *names.entry(normalize(&recipe.name)).or_default() += 1;
        }
        // report with the first spelling seen
        for recipe in &file.recipes {
            if names.remove(&normalize(&recipe.name)).is_some_and(|n| n > 1) {
                violations.push(Violation::DuplicateName {
                    file: file.meal_type,
                    name: recipe.name.clone(),
                });
            }
        }
    }

    for recipe in files.iter().flat_map(|f| &f.recipes) {
        let Some(url) = recipe.image.as_deref() else {
            continue;
        };
        let exists = image_file_path(images_dir, url).is_some_and(|p| p.is_file());
        if !exists {
            violations.push(Violation::MissingImage {
                recipe_id: recipe.id.clone(),
                path: url.to_string(),
            });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::catalog::test_support::recipe;

    #[test]
    fn reports_ids_names_and_images() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("recipes")).unwrap();
        std::fs::write(dir.path().join("recipes/oats.jpg"), b"x").unwrap();

        let mut oats = recipe("b1", "Oats", MealType::Breakfast, &["oats"]);
        oats.image = Some("/images/recipes/oats.jpg".into());
        let mut eggs = recipe("b2", "Eggs", MealType::Breakfast, &["eggs"]);
        eggs.image = Some("/images/recipes/eggs.jpg".into());
        let files = vec![
            RecipeFile {
                path: PathBuf::from("breakfast.json"),
                meal_type: MealType::Breakfast,
                recipes: vec![oats, eggs, recipe("b3", "eggs!", MealType::Breakfast, &["eggs"])],
            },
            RecipeFile {
                path: PathBuf::from("lunch.json"),
                meal_type: MealType::Lunch,
                recipes: vec![recipe("b1", "Soup", MealType::Lunch, &["stock"])],
            },
        ];

        let violations = check(&files, dir.path());
        assert_eq!(
            violations,
            vec![
                Violation::DuplicateId {
                    id: "b1".into(),
                    files: vec![MealType::Breakfast, MealType::Lunch]
                },
                Violation::DuplicateName {
                    file: MealType::Breakfast,
                    name: "Eggs".into()
                },
                Violation::MissingImage {
                    recipe_id: "b2".into(),
                    path: "/images/recipes/eggs.jpg".into()
                },
            ]
        );
        assert_eq!(violations[0].to_string(), "duplicate id b1 in breakfast, lunch");
    }

    #[test]
    fn bundled_fixtures_are_clean() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let files = crate::repair::load_files(&root.join("data/recipes")).unwrap();
        assert_eq!(check(&files, &root.join("static/images")), Vec::new());
        assert!(crate::repair::list_image_files(&root.join("static/images")).is_ok());
    }
}
