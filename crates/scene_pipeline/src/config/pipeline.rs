//! # Pipeline Configuration
//!
//! Describes which render passes exist, how each pass orders its commands,
//! whether a shadow collection is maintained, and the default log level.
//!
//! ```toml
//! shadows_enabled = true
//!
//! [[passes]]
//! id = 0
//! name = "opaque"
//! sort = "near_to_far"
//!
//! [[passes]]
//! id = 1
//! name = "transparent"
//! sort = "far_to_near"
//!
//! [logging]
//! level = "info"
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::render::{comparators, CommandComparator, PassId};

/// Ordering applied to the bucket of one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Append-only; commands render in insertion order
    #[default]
    Unsorted,
    /// 2D ordering: lower z-index drawn first
    ZIndexAscending,
    /// 3D ordering: closest to the camera drawn first (opaque passes)
    NearToFar,
    /// 3D ordering: farthest from the camera drawn first (alpha blending)
    FarToNear,
}

impl SortMode {
    /// Comparator for this mode, `None` for unsorted passes
    pub fn comparator(self) -> Option<CommandComparator> {
        match self {
            Self::Unsorted => None,
            Self::ZIndexAscending => Some(comparators::z_index_ascending()),
            Self::NearToFar => Some(comparators::near_to_far()),
            Self::FarToNear => Some(comparators::far_to_near()),
        }
    }
}

/// One render pass of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassConfig {
    /// Pass id commands are tagged with
    pub id: PassId,
    /// Human readable name, used in logs only
    #[serde(default)]
    pub name: String,
    /// Bucket ordering
    #[serde(default)]
    pub sort: SortMode,
}

impl PassConfig {
    /// Create a pass description
    pub fn new(id: PassId, name: impl Into<String>, sort: SortMode) -> Self {
        Self {
            id,
            name: name.into(),
            sort,
        }
    }
}

/// Log level names accepted in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Logging disabled
    Off,
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    #[default]
    Info,
    /// Debug output
    Debug,
    /// Everything, including per-frame traces
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

/// Logging section of the pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` does not override it
    #[serde(default)]
    pub level: LogLevel,
}

/// Top-level pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Passes of the main collection
    pub passes: Vec<PassConfig>,
    /// Passes of the shadow collection
    #[serde(default)]
    pub shadow_passes: Vec<PassConfig>,
    /// Whether the driver runs the shadow collection at all
    #[serde(default)]
    pub shadows_enabled: bool,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            passes: vec![
                PassConfig::new(0, "opaque", SortMode::NearToFar),
                PassConfig::new(1, "transparent", SortMode::FarToNear),
                PassConfig::new(2, "overlay", SortMode::ZIndexAscending),
            ],
            shadow_passes: vec![PassConfig::new(0, "shadow_casters", SortMode::Unsorted)],
            shadows_enabled: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Check that no collection declares the same pass id twice
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::check_unique("passes", &self.passes)?;
        Self::check_unique("shadow_passes", &self.shadow_passes)?;
        if self.passes.is_empty() {
            return Err(ConfigError::Invalid("at least one pass is required".to_string()));
        }
        Ok(())
    }

    fn check_unique(section: &str, passes: &[PassConfig]) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for pass in passes {
            if !seen.insert(pass.id) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate pass id {} in {section}",
                    pass.id
                )));
            }
        }
        Ok(())
    }
}

impl Config for PipelineConfig {}
