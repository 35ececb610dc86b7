use std::fs;
use std::path::Path;

use bevy_utils::tracing::warn;
use serde::{Deserialize, Serialize};

use crate::data::criteria::CatalogDataError;
use crate::rules::criterion_type::CriterionScope;

const DEFAULT_DAILY_RESET_HOUR: u8 = 6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackerSettings {
    /// Scope of criteria this process tracks for its actors.
    #[serde(default)]
    pub scope: CriterionScope,
    /// Hour of day (UTC) at which daily quests roll over.
    #[serde(default = "default_daily_reset_hour")]
    pub daily_reset_hour: u8,
}

fn default_daily_reset_hour() -> u8 {
    DEFAULT_DAILY_RESET_HOUR
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            scope: CriterionScope::default(),
            daily_reset_hour: DEFAULT_DAILY_RESET_HOUR,
        }
    }
}

pub fn load_tracker_settings(path: impl AsRef<Path>) -> Result<TrackerSettings, CatalogDataError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| CatalogDataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let settings: TrackerSettings =
        serde_json::from_str(&raw).map_err(|source| CatalogDataError::Json {
            path: path.display().to_string(),
            source,
        })?;
    if settings.daily_reset_hour > 23 {
        return Err(CatalogDataError::Validation(format!(
            "daily_reset_hour must be 0-23, got {}",
            settings.daily_reset_hour
        )));
    }
    Ok(settings)
}

/// Loads settings, falling back to defaults when the file is missing or bad.
pub fn load_tracker_settings_or_default(path: impl AsRef<Path>) -> TrackerSettings {
    match load_tracker_settings(path) {
        Ok(settings) => settings,
        Err(err) => {
            warn!("using default tracker settings: {}", err);
            TrackerSettings::default()
        }
    }
}
