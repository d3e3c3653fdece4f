//! JSON content-catalog loading with a built-in offline fallback.

use std::path::Path;
use std::time::Duration;

use gem_defence_core::{EffectSet, FusionRecipe, GemCatalog, GemType, GemTypeId};
use serde::Deserialize;
use thiserror::Error;

/// Errors produced while loading a content catalog from disk.
#[derive(Debug, Error)]
pub(crate) enum CatalogError {
    /// The catalog file could not be read.
    #[error("could not read catalog file: {0}")]
    Io(#[from] std::io::Error),
    /// The catalog file was not valid JSON of the expected shape.
    #[error("could not parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    /// A recipe's required list held something other than gem ids.
    #[error("recipe required list '{0}' contains an invalid gem id")]
    InvalidRequiredList(String),
}

/// On-disk catalog shape mirroring the content store's REST payloads.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    gems: Vec<GemRecord>,
    #[serde(default)]
    recipes: Vec<RecipeRecord>,
}

/// Gem row as stored by the content service.
#[derive(Debug, Deserialize)]
struct GemRecord {
    id: u32,
    name: String,
    damage: f32,
    speed_ms: u64,
    range: f32,
    #[serde(default)]
    effects: String,
    #[serde(default)]
    droppable: bool,
    #[serde(default)]
    base: bool,
}

/// Recipe row as stored by the content service; `required` is the same
/// comma-joined id list the service keeps in its database.
#[derive(Debug, Deserialize)]
struct RecipeRecord {
    required: String,
    min_count: u32,
    result: u32,
}

/// Loads gem types and fusion recipes from a JSON catalog file.
pub(crate) fn load(path: &Path) -> Result<(GemCatalog, Vec<FusionRecipe>), CatalogError> {
    let raw = std::fs::read_to_string(path)?;
    let file: CatalogFile = serde_json::from_str(&raw)?;

    let gems = file
        .gems
        .into_iter()
        .map(|record| {
            GemType::new(
                GemTypeId::new(record.id),
                record.name,
                record.damage,
                Duration::from_millis(record.speed_ms),
                record.range,
                EffectSet::parse(&record.effects),
                record.droppable,
                record.base,
            )
        })
        .collect();

    let mut recipes = Vec::with_capacity(file.recipes.len());
    for record in file.recipes {
        recipes.push(FusionRecipe::new(
            parse_required(&record.required)?,
            record.min_count,
            GemTypeId::new(record.result),
        ));
    }

    Ok((GemCatalog::from_types(gems), recipes))
}

fn parse_required(list: &str) -> Result<Vec<GemTypeId>, CatalogError> {
    list.split(',')
        .map(|entry| {
            entry
                .trim()
                .parse::<u32>()
                .map(GemTypeId::new)
                .map_err(|_| CatalogError::InvalidRequiredList(list.to_owned()))
        })
        .collect()
}
