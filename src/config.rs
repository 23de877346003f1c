use std::{io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arc::DEFAULT_CIRCLE_RADIUS_NM;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read parser config: {0}")]
    FileRead(#[from] io::Error),
    #[error("failed to deserialize parser config: {0}")]
    Deserialize(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// ENR 2.1 and ENR 2.2
    #[default]
    Enroute,
    /// AD 2.17, airspaces are named after their aerodrome unit
    Aerodrome,
    /// ENR 5.1
    DangerAreas,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcIndexing {
    /// Every arc of an area uses entry 0. This is how existing sector
    /// data was produced, areas with several differently turning arcs
    /// need `Sequential`.
    #[default]
    Frozen,
    Sequential,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// ICAO nationality letters prefixing danger area identifiers
    pub country: String,
    pub mode: ParseMode,
    pub arc_indexing: ArcIndexing,
    pub default_circle_radius_nm: f64,
    /// how many tokens an arc anchor may be away from the previous one
    pub max_anchor_distance: usize,
    /// radius values above this are metres instead of nautical miles
    pub metre_radius_threshold: f64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            country: "EG".to_string(),
            mode: ParseMode::default(),
            arc_indexing: ArcIndexing::default(),
            default_circle_radius_nm: DEFAULT_CIRCLE_RADIUS_NM,
            max_anchor_distance: 16,
            metre_radius_threshold: 100.0,
        }
    }
}

impl ParserConfig {
    pub fn from_json(content: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&fs_err::read(path.as_ref())?)
    }
}
