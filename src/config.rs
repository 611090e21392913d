// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Engine configuration

use crate::error::ConfigError;
use crate::geometry::primitives::{DEFAULT_RINGS, DEFAULT_SEGMENTS};
use crate::ops::fillet::DEFAULT_FILLET_SEGMENTS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Default config file looked up in the working directory
pub const CONFIG_FILE: &str = "kcl.toml";

/// How entries are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationOrder {
    /// Fixed category order; forward references are reported and skipped
    #[default]
    Category,
    /// Topological order of the reference graph
    Dependency,
}

impl FromStr for EvaluationOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category" => Ok(EvaluationOrder::Category),
            "dependency" | "topological" => Ok(EvaluationOrder::Dependency),
            _ => Err(ConfigError::InvalidValue {
                key: "order",
                value: s.to_string(),
            }),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub order: EvaluationOrder,
    /// Circumferential segments for round shapes without an explicit count
    pub default_segments: u32,
    /// Latitudinal rings for spheres
    pub sphere_rings: u32,
    /// Angular segments on rounded edges
    pub fillet_segments: u32,
    /// `tracing` filter used by the binary
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            order: EvaluationOrder::Category,
            default_segments: DEFAULT_SEGMENTS,
            sphere_rings: DEFAULT_RINGS,
            fillet_segments: DEFAULT_FILLET_SEGMENTS,
            log_filter: "warn".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// `kcl.toml` from the working directory when present, then environment
    /// overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = if Path::new(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `KCL_EVAL_ORDER`, `KCL_SEGMENTS` and `KCL_LOG` from `lookup`
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(order) = lookup("KCL_EVAL_ORDER") {
            self.order = order.parse()?;
        }
        if let Some(segments) = lookup("KCL_SEGMENTS") {
            self.default_segments = segments
                .trim()
                .parse()
                .ok()
                .filter(|&n: &u32| n >= 3)
                .ok_or(ConfigError::InvalidValue {
                    key: "default_segments",
                    value: segments,
                })?;
        }
        if let Some(filter) = lookup("KCL_LOG") {
            self.log_filter = filter;
        }
        Ok(())
    }
}
