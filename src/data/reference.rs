use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::criteria::CatalogDataError;

/// Static lookups predicates and progress rules need beyond actor state.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceData {
    /// Quest id to zone id; negative values are quest-sort categories.
    #[serde(default)]
    pub quest_zones: HashMap<u32, i32>,
    #[serde(default)]
    pub item_quality: HashMap<u32, u32>,
    #[serde(default)]
    pub active_world_events: HashSet<u32>,
}

pub fn load_reference_data(path: impl AsRef<Path>) -> Result<ReferenceData, CatalogDataError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| CatalogDataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogDataError::Json {
        path: path.display().to_string(),
        source,
    })
}
