// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scope configuration.
//!
//! [`ScopeConfig`] is the persisted, user-editable form: enum-like settings are
//! kept as strings so a hand-edited file never fails to load. [`ScopeConfig::resolve`]
//! turns it into typed [`ResolvedSettings`], replacing anything unusable with a
//! default and reporting what it replaced.

use std::collections::BTreeSet;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::aircraft::FlightRules;
use crate::error::ConfigError;
use crate::label::datablock::DEFAULT_FLASH_PERIOD_SECS;
use crate::label::LabelFormat;
use crate::proximity::RangeLimitsTable;
use crate::tracks::VectorLineMode;

/// Persisted settings of one scope.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScopeConfig {
    /// Name shown in the scope's title
    #[serde(default = "default_name")]
    pub name: String,

    /// Move labels out of each other's way
    #[serde(default = "default_true")]
    pub automatic_layout: bool,

    /// Lowest altitude shown, in feet
    #[serde(default)]
    pub min_altitude: i32,

    /// Highest altitude shown, in feet
    #[serde(default = "default_max_altitude")]
    pub max_altitude: i32,

    /// Datablock format: "none", "simple", "ground", "tower" or "full"
    #[serde(default = "default_label_format")]
    pub label_format: String,

    /// Seconds each of the two datablock texts is shown
    #[serde(default = "default_flash_period")]
    pub label_flash_period: u32,

    /// Number of history returns drawn behind each track
    #[serde(default = "default_radar_tracks_drawn")]
    pub radar_tracks_drawn: usize,

    /// Draw velocity vector lines
    #[serde(default)]
    pub draw_vector_lines: bool,

    /// Vector line unit: "nm" or "minutes"
    #[serde(default = "default_vector_line_mode")]
    pub vector_line_mode: String,

    /// Vector line length in `vector_line_mode` units
    #[serde(default = "default_vector_line_extent")]
    pub vector_line_extent: f64,

    /// Separation limits, one entry per flight-rule category (IFR, VFR)
    #[serde(default)]
    pub range_limits: RangeLimitsTable,

    /// Pair up arrivals automatically when no in-trail sequence is set
    #[serde(default)]
    pub auto_mit: bool,

    /// Arrival airports considered for automatic in-trail spacing
    #[serde(default)]
    pub auto_mit_airports: BTreeSet<String>,

    /// Show converging-runway ghosts
    #[serde(default)]
    pub draw_ghosts: bool,

    /// Magnetic variation in degrees, added to true bearings
    #[serde(default)]
    pub magnetic_variation: f64,
}

// Default value functions for serde
fn default_name() -> String {
    "Scope".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_altitude() -> i32 {
    60_000
}

fn default_label_format() -> String {
    LabelFormat::Ground.to_string()
}

fn default_flash_period() -> u32 {
    DEFAULT_FLASH_PERIOD_SECS
}

fn default_radar_tracks_drawn() -> usize {
    5
}

fn default_vector_line_mode() -> String {
    VectorLineMode::Minutes.to_string()
}

fn default_vector_line_extent() -> f64 {
    1.0
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            automatic_layout: true,
            min_altitude: 0,
            max_altitude: default_max_altitude(),
            label_format: default_label_format(),
            label_flash_period: default_flash_period(),
            radar_tracks_drawn: default_radar_tracks_drawn(),
            draw_vector_lines: false,
            vector_line_mode: default_vector_line_mode(),
            vector_line_extent: default_vector_line_extent(),
            range_limits: RangeLimitsTable::default(),
            auto_mit: false,
            auto_mit_airports: BTreeSet::new(),
            draw_ghosts: false,
            magnetic_variation: 0.0,
        }
    }
}

/// Typed settings a display works from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub automatic_layout: bool,
    pub min_altitude: i32,
    pub max_altitude: i32,
    pub label_format: LabelFormat,
    pub flash_period_secs: u32,
    pub radar_tracks_drawn: usize,
    /// Mode and extent, or `None` when vector lines are off.
    pub vector_lines: Option<(VectorLineMode, f64)>,
    pub range_limits: RangeLimitsTable,
    pub auto_mit: bool,
    pub auto_mit_airports: BTreeSet<String>,
    pub draw_ghosts: bool,
    pub magnetic_variation: f64,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        ScopeConfig::default().resolve().0
    }
}

impl ScopeConfig {
    /// Typed settings plus every problem that had to be papered over.
    #[must_use]
    pub fn resolve(&self) -> (ResolvedSettings, Vec<ConfigError>) {
        let mut errors = Vec::new();

        let label_format = self.label_format.parse::<LabelFormat>().unwrap_or_else(|e| {
            errors.push(e);
            LabelFormat::Full
        });

        let vector_lines = if self.draw_vector_lines {
            match self.vector_line_mode.parse::<VectorLineMode>() {
                Ok(mode) => Some((mode, self.vector_line_extent)),
                Err(e) => {
                    errors.push(e);
                    None
                }
            }
        } else {
            None
        };

        let (mut min_altitude, mut max_altitude) = (self.min_altitude, self.max_altitude);
        if min_altitude > max_altitude {
            errors.push(ConfigError::InvertedAltitudeFilter {
                min: min_altitude,
                max: max_altitude,
            });
            std::mem::swap(&mut min_altitude, &mut max_altitude);
        }

        let flash_period_secs = if self.label_flash_period == 0 {
            errors.push(ConfigError::ZeroFlashPeriod);
            DEFAULT_FLASH_PERIOD_SECS
        } else {
            self.label_flash_period
        };

        let mut range_limits = self.range_limits;
        let defaults = RangeLimitsTable::default();
        for rules in FlightRules::ALL {
            if !range_limits[rules].is_consistent() {
                errors.push(ConfigError::InvalidRangeLimits { rules });
                range_limits[rules] = defaults[rules];
            }
        }

        for e in &errors {
            warn!("Scope '{}': {e}", self.name);
        }

        let settings = ResolvedSettings {
            automatic_layout: self.automatic_layout,
            min_altitude,
            max_altitude,
            label_format,
            flash_period_secs,
            radar_tracks_drawn: self.radar_tracks_drawn,
            vector_lines,
            range_limits,
            auto_mit: self.auto_mit,
            auto_mit_airports: self.auto_mit_airports.clone(),
            draw_ghosts: self.draw_ghosts,
            magnetic_variation: self.magnetic_variation,
        };
        (settings, errors)
    }
}
