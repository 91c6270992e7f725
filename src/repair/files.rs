use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::info;

use super::RepairError;
use crate::catalog::{read_recipe_file, MealType, Recipe, SOURCE_FILES};

/// One fixture file as stored on disk, before any bucket overrides.
#[derive(Debug, Clone)]
pub struct RecipeFile {
    pub path: PathBuf,
    pub meal_type: MealType,
    pub recipes: Vec<Recipe>,
}

impl RecipeFile {
    /// Letter that ids in this file start with (`b12`, `l3`, `d7`).
    pub fn id_prefix(&self) -> &'static str {
        match self.meal_type {
            MealType::Breakfast => "b",
            MealType::Lunch => "l",
            MealType::Dinner => "d",
            MealType::Snack => "s",
        }
    }
}

pub fn load_files(dir: &Path) -> Result<Vec<RecipeFile>, RepairError> {
    let mut files = Vec::with_capacity(SOURCE_FILES.len());
    for (name, meal_type) in SOURCE_FILES {
        let path = dir.join(name);
        let recipes = read_recipe_file(&path)?;
        files.push(RecipeFile {
            path,
            meal_type,
            recipes,
        });
    }
    Ok(files)
}

/// Replaces `path` with the pretty-printed recipes. The data goes to a
/// temporary file in the same directory first and is renamed over the
/// target, so readers never see a half-written fixture.
pub fn write_recipes(path: &Path, recipes: &[Recipe]) -> Result<(), RepairError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let io_err = |source: std::io::Error| RepairError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    serde_json::to_writer_pretty(&mut tmp, recipes).map_err(|source| RepairError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.write_all(b"\n").map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    info!(path = %path.display(), recipes = recipes.len(), "recipe file written");
    Ok(())
}
