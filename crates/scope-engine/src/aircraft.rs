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

//! Per-frame aircraft snapshot types.
//!
//! The scope never owns aircraft; each frame it is handed a consistent
//! snapshot of every aircraft the surveillance source knows about. Aircraft
//! are identified by [`AircraftId`], which is stable across frames.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::{GroundVector, LatLong};

/// Stable aircraft identity.
///
/// Identity comparison only; there is deliberately no ordering. Ghost
/// aircraft derive their identity from their source with [`AircraftId::ghost`],
/// which can never compare equal to the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AircraftId {
    icao: String,
    #[serde(default)]
    ghost: bool,
}

impl AircraftId {
    #[must_use]
    pub fn new(icao: impl Into<String>) -> Self {
        Self {
            icao: icao.into(),
            ghost: false,
        }
    }

    /// Identity of the ghost projected from this aircraft.
    #[must_use]
    pub fn ghost(&self) -> Self {
        Self {
            icao: self.icao.clone(),
            ghost: true,
        }
    }

    #[must_use]
    pub fn is_ghost(&self) -> bool {
        self.ghost
    }

    #[must_use]
    pub fn icao(&self) -> &str {
        &self.icao
    }
}

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ghost {
            write!(f, "{}~ghost", self.icao)
        } else {
            f.write_str(&self.icao)
        }
    }
}

/// Flight-rule category; indexes the range limits table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlightRules {
    #[default]
    Ifr,
    Vfr,
}

impl FlightRules {
    pub const COUNT: usize = 2;
    pub const ALL: [FlightRules; Self::COUNT] = [FlightRules::Ifr, FlightRules::Vfr];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Ifr => 0,
            Self::Vfr => 1,
        }
    }
}

/// Transponder mode as reported by the surveillance source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransponderMode {
    Standby,
    #[default]
    Charlie,
}

/// Beacon code, stored as its octal digits' value (e.g. `0o1200`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Squawk(pub u16);

impl Squawk {
    pub const VFR: Squawk = Squawk(0o1200);
}

impl fmt::Display for Squawk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

/// One aircraft as seen in the current frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftSnapshot {
    pub id: AircraftId,
    #[serde(default)]
    pub callsign: String,
    pub position: LatLong,
    /// Heading in degrees true.
    #[serde(default)]
    pub heading: f64,
    /// Zero until enough returns have been seen to derive a track.
    #[serde(default)]
    pub ground_vector: GroundVector,
    /// Altitude in feet.
    #[serde(default)]
    pub altitude: i32,
    #[serde(default)]
    pub flight_rules: FlightRules,
    #[serde(default)]
    pub aircraft_type: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub squawk: Squawk,
    #[serde(default)]
    pub mode: TransponderMode,
    #[serde(default)]
    pub lost_track: bool,
    /// Previous radar returns, newest first.
    #[serde(default)]
    pub history: Vec<LatLong>,
    /// Controller currently tracking the aircraft, with their scope symbol.
    #[serde(default)]
    pub tracking_controller: Option<TrackingController>,
    #[serde(default)]
    pub inbound_handoff: Option<String>,
    #[serde(default)]
    pub outbound_handoff: Option<String>,
}

/// A controller's callsign together with the single-character symbol drawn
/// at tracks they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingController {
    pub callsign: String,
    #[serde(default)]
    pub symbol: Option<char>,
}

impl AircraftSnapshot {
    /// Minimal snapshot with everything but identity and position defaulted.
    #[must_use]
    pub fn new(id: AircraftId, callsign: impl Into<String>, position: LatLong) -> Self {
        Self {
            id,
            callsign: callsign.into(),
            position,
            heading: 0.0,
            ground_vector: GroundVector::default(),
            altitude: 0,
            flight_rules: FlightRules::default(),
            aircraft_type: None,
            destination: None,
            squawk: Squawk::default(),
            mode: TransponderMode::default(),
            lost_track: false,
            history: Vec::new(),
            tracking_controller: None,
            inbound_handoff: None,
            outbound_handoff: None,
        }
    }

    /// Tracked and inside the `[min, max]` altitude window.
    #[must_use]
    pub fn is_visible(&self, min_altitude: i32, max_altitude: i32) -> bool {
        !self.lost_track && self.altitude >= min_altitude && self.altitude <= max_altitude
    }

    #[must_use]
    pub fn has_heading(&self) -> bool {
        self.ground_vector.is_usable()
    }

    /// Key used wherever iteration order must be deterministic.
    #[must_use]
    pub fn sort_key(&self) -> (String, String) {
        (self.callsign.clone(), self.id.to_string())
    }
}
