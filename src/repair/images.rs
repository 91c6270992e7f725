use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use super::RepairError;
use crate::catalog::Recipe;

/// Sub-directory of the image root holding recipe photos.
pub const RECIPE_IMAGE_DIR: &str = "recipes";
const URL_ROOT: &str = "/images/";
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Last-resort pairs: a recipe whose name contains the keyword takes the first
/// image whose name contains the target.
const KEYWORD_FALLBACK: [(&str, &str); 4] = [
    ("oat", "oatmeal"),
    ("egg", "eggs"),
    ("salmon", "salmon"),
    ("chicken", "chicken"),
];

lazy_static! {
    static ref SEPARATORS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Lowercase, non-alphanumerics collapsed to single spaces, trimmed.
pub fn normalize(s: &str) -> String {
    SEPARATORS
        .replace_all(&s.to_lowercase(), " ")
        .trim()
        .to_string()
}

fn stem(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem)
}

/// Maps an `/images/...` URL onto the image directory on disk.
pub fn image_file_path(images_dir: &Path, url: &str) -> Option<PathBuf> {
    let rel = url.strip_prefix(URL_ROOT)?;
    if rel.is_empty() || rel.split('/').any(|seg| seg == "..") {
        return None;
    }
    Some(images_dir.join(rel))
}

/// Image file names under `<images_dir>/recipes`, sorted.
pub fn list_image_files(images_dir: &Path) -> Result<Vec<String>, RepairError> {
    let dir = images_dir.join(RECIPE_IMAGE_DIR);
    let io_err = |source: std::io::Error| RepairError::Io {
        path: dir.clone(),
        source,
    };
    let mut names = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let ext = name
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .unwrap_or_default();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Picks the image for a recipe name: exact normalized match, then
/// containment in either direction, then the keyword table.
pub fn best_image<'a>(name: &str, candidates: &'a [String]) -> Option<&'a str> {
    let wanted = normalize(name);
    if wanted.is_empty() {
        return None;
    }
    let stems: Vec<(String, &'a str)> = candidates
        .iter()
        .map(|c| (normalize(stem(c)), c.as_str()))
        .filter(|(s, _)| !s.is_empty())
        .collect();

    if let Some((_, file)) = stems.iter().find(|(s, _)| *s == wanted) {
        return Some(file);
    }
    if let Some((_, file)) = stems
        .iter()
        .find(|(s, _)| s.contains(wanted.as_str()) || wanted.contains(s.as_str()))
    {
        return Some(file);
    }
    KEYWORD_FALLBACK
        .iter()
        .filter(|(keyword, _)| wanted.contains(keyword))
        .find_map(|(_, target)| stems.iter().find(|(s, _)| s.contains(target)))
        .map(|(_, file)| *file)
}

#[derive(Debug, Default)]
pub struct MatchReport {
    pub matched: usize,
    /// Ids of recipes left with their previous image path.
    pub unmatched: Vec<String>,
}

pub fn match_images(recipes: &mut [Recipe], candidates: &[String]) -> MatchReport {
    let mut report = MatchReport::default();
    for recipe in recipes.iter_mut() {
        match best_image(&recipe.name, candidates) {
            Some(file) => {
                recipe.image = Some(format!("{URL_ROOT}{RECIPE_IMAGE_DIR}/{file}"));
                report.matched += 1;
            }
            None => report.unmatched.push(recipe.id.clone()),
        }
    }
    report
}

/// Moves image paths from one naming scheme to another: `from` is replaced by
/// `to`, and the extension is swapped when `ext` is given. Returns how many
/// recipes changed.
pub fn rewrite_images(recipes: &mut [Recipe], from: &str, to: &str, ext: Option<&str>) -> usize {
    let mut changed = 0;
    for recipe in recipes.iter_mut() {
        let Some(path) = recipe.image.as_deref() else {
            continue;
        };
        let Some(rest) = path.strip_prefix(from) else {
            continue;
        };
        let mut rewritten = format!("{to}{rest}");
        if let Some(ext) = ext {
            let ext = ext.trim_start_matches('.');
            let file_start = rewritten.rfind('/').map_or(0, |i| i + 1);
            if let Some(dot) = rewritten[file_start..].rfind('.') {
                rewritten.truncate(file_start + dot);
            }
            rewritten.push('.');
            rewritten.push_str(ext);
        }
        if recipe.image.as_deref() != Some(rewritten.as_str()) {
            recipe.image = Some(rewritten);
            changed += 1;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{test_support::recipe, MealType};

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn normalizes_separators() {
        assert_eq!(normalize("  Overnight_Oats--(Vegan) "), "overnight oats vegan");
        assert_eq!(normalize("***"), "");
    }

    #[test]
    fn prefers_exact_then_containment_then_keyword() {
        let images = files(&["avocado-toast.jpg", "overnight-oats.jpg", "oatmeal.png", "scrambled-eggs.webp"]);
        assert_eq!(best_image("Overnight Oats", &images), Some("overnight-oats.jpg"));
        // image name inside recipe name
        assert_eq!(best_image("Avocado Toast with Chili", &images), Some("avocado-toast.jpg"));
        // recipe name inside image name
        assert_eq!(best_image("Scrambled", &images), Some("scrambled-eggs.webp"));
        // keyword table
        assert_eq!(best_image("Steel-cut oat porridge", &images), Some("oatmeal.png"));
        assert_eq!(best_image("Deviled egg plate", &images), Some("scrambled-eggs.webp"));
        assert_eq!(best_image("Mushroom Risotto", &images), None);
    }

    #[test]
    fn unmatched_recipes_keep_their_path() {
        let mut recipes = vec![
            recipe("d1", "Lemon Salmon", MealType::Dinner, &["salmon"]),
            recipe("d2", "Mushroom Risotto", MealType::Dinner, &["rice"]),
        ];
        recipes[1].image = Some("/images/recipes/old.jpg".into());
        let report = match_images(&mut recipes, &files(&["baked-salmon.jpg"]));

        assert_eq!(report.matched, 1);
        assert_eq!(report.unmatched, vec!["d2".to_string()]);
        assert_eq!(recipes[0].image.as_deref(), Some("/images/recipes/baked-salmon.jpg"));
        assert_eq!(recipes[1].image.as_deref(), Some("/images/recipes/old.jpg"));
    }

    #[test]
    fn rewrites_prefix_and_extension() {
        let mut recipes = vec![
            recipe("b1", "Oats", MealType::Breakfast, &["oats"]),
            recipe("b2", "Eggs", MealType::Breakfast, &["eggs"]),
            recipe("b3", "Toast", MealType::Breakfast, &["bread"]),
        ];
        recipes[0].image = Some("/img/oats.png".into());
        recipes[1].image = Some("/images/recipes/eggs.jpg".into());

        let changed = rewrite_images(&mut recipes, "/img/", "/images/recipes/", Some("jpg"));
        assert_eq!(changed, 1);
        assert_eq!(recipes[0].image.as_deref(), Some("/images/recipes/oats.jpg"));
        assert_eq!(recipes[1].image.as_deref(), Some("/images/recipes/eggs.jpg"));
        assert_eq!(recipes[2].image, None);
    }

    #[test]
    fn lists_only_image_files() {
        let dir = tempfile::tempdir().unwrap();
        let recipes_dir = dir.path().join(RECIPE_IMAGE_DIR);
        std::fs::create_dir(&recipes_dir).unwrap();
        for name in ["b.jpg", "a.PNG", "notes.txt"] {
            std::fs::write(recipes_dir.join(name), b"x").unwrap();
        }
        assert_eq!(list_image_files(dir.path()).unwrap(), vec!["a.PNG", "b.jpg"]);
    }

    #[test]
    fn maps_urls_into_image_dir() {
        let root = Path::new("static/images");
        assert_eq!(
            image_file_path(root, "/images/recipes/oats.jpg"),
            Some(root.join("recipes/oats.jpg"))
        );
        assert_eq!(image_file_path(root, "https://cdn.example.com/oats.jpg"), None);
        assert_eq!(image_file_path(root, "/images/../secret"), None);
    }
}
