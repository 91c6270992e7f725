use std::{collections::HashMap, path::Path};

use rand::{seq::SliceRandom, Rng};
use tracing::{info, warn};

use super::{CatalogError, MealType, Recipe};

/// Recipe ids whose bucket differs from the file they are stored in.
const BUCKET_OVERRIDES: &[(&str, MealType)] = &[
    ("b7", MealType::Snack),
    ("b8", MealType::Snack),
    ("l8", MealType::Snack),
];

/// Files that make up the catalog, with the bucket each one implies.
pub const SOURCE_FILES: [(&str, MealType); 3] = [
    ("breakfast.json", MealType::Breakfast),
    ("lunch.json", MealType::Lunch),
    ("dinner.json", MealType::Dinner),
];

fn bucket_override(id: &str) -> Option<MealType> {
    BUCKET_OVERRIDES
        .iter()
        .find(|(override_id, _)| *override_id == id)
        .map(|(_, bucket)| *bucket)
}

/// Immutable in-memory recipe catalog partitioned into meal-type buckets.
#[derive(Debug, Default)]
pub struct Catalog {
    recipes: Vec<Recipe>,
    buckets: HashMap<MealType, Vec<usize>>,
    by_id: HashMap<String, usize>,
}

pub fn read_recipe_file(path: &Path) -> Result<Vec<Recipe>, CatalogError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
        path: path.display().to_string(),
        source,
    })
}

impl Catalog {
    /// Loads `breakfast.json`, `lunch.json` and `dinner.json` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let mut sources = Vec::with_capacity(SOURCE_FILES.len());
        for (file, bucket) in SOURCE_FILES {
            sources.push((bucket, read_recipe_file(&dir.join(file))?));
        }
        let catalog = Self::from_sources(sources);
        info!(
            dir = %dir.display(),
            recipes = catalog.len(),
            breakfast = catalog.count(MealType::Breakfast),
            lunch = catalog.count(MealType::Lunch),
            dinner = catalog.count(MealType::Dinner),
            snack = catalog.count(MealType::Snack),
            "recipe catalog loaded"
        );
        Ok(catalog)
    }

    /// Builds a catalog from recipe lists tagged with the bucket their file
    /// implies. Catalog order is the order of `sources`, then file order.
    pub fn from_sources(sources: Vec<(MealType, Vec<Recipe>)>) -> Self {
        let mut catalog = Catalog::default();
        for (source_bucket, recipes) in sources {
            for mut recipe in recipes {
                let bucket = bucket_override(&recipe.id).unwrap_or(source_bucket);
                recipe.meal_type = bucket;
                let idx = catalog.recipes.len();
                if catalog.by_id.contains_key(&recipe.id) {
                    warn!(id = %recipe.id, name = %recipe.name, "duplicate recipe id; first one wins for id lookup");
                } else {
                    catalog.by_id.insert(recipe.id.clone(), idx);
                }
                catalog.buckets.entry(bucket).or_default().push(idx);
                catalog.recipes.push(recipe);
            }
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn count(&self, meal_type: MealType) -> usize {
        self.buckets.get(&meal_type).map_or(0, Vec::len)
    }

    pub fn all(&self) -> &[Recipe] {
        &self.recipes
    }

    fn bucket(&self, meal_type: MealType) -> &[usize] {
        self.buckets
            .get(&meal_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every recipe whose effective bucket is `meal_type`, in catalog order.
    pub fn recipes_by_meal_type(&self, meal_type: MealType) -> Vec<&Recipe> {
        self.bucket(meal_type)
            .iter()
            .map(|&idx| &self.recipes[idx])
            .collect()
    }

    /// Uniform draw from the bucket; `None` only when the bucket is empty.
    pub fn random_recipe<R: Rng + ?Sized>(&self, meal_type: MealType, rng: &mut R) -> Option<&Recipe> {
        self.bucket(meal_type)
            .choose(rng)
            .map(|&idx| &self.recipes[idx])
    }

    /// Case-insensitive containment in either direction; the first recipe in
    /// catalog order wins.
    pub fn find_recipe_by_name(&self, text: &str, meal_type: MealType) -> Option<&Recipe> {
        let query = text.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.bucket(meal_type)
            .iter()
            .map(|&idx| &self.recipes[idx])
            .find(|recipe| {
                let name = recipe.name.trim().to_lowercase();
                !name.is_empty() && (name.contains(&query) || query.contains(&name))
            })
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Recipe> {
        self.by_id.get(id).map(|&idx| &self.recipes[idx])
    }
}
