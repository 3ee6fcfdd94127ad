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

//! Track symbols, history trails and velocity vector lines.

use std::fmt;
use std::str::FromStr;

use crate::aircraft::{AircraftSnapshot, Squawk, TransponderMode};
use crate::error::ConfigError;
use crate::geo::LatLong;
use crate::geometry::Vec2;
use crate::projection::Projector;

/// Vector lines shorter than this in the window are drawn from the track.
const VECTOR_LINE_CLEARANCE_MIN: f32 = 12.0;
/// Gap left between the track symbol and its vector line.
const VECTOR_LINE_CLEARANCE: f32 = 6.0;

/// Symbol drawn at an aircraft's current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSymbol {
    /// Transponder in standby: a plain dot.
    Standby,
    /// Squawking VFR (1200).
    Vfr,
    /// Owned by a controller; their position symbol, `?` if unknown.
    Tracked(char),
    Untracked,
}

impl TrackSymbol {
    #[must_use]
    pub fn for_aircraft(ac: &AircraftSnapshot) -> Self {
        if ac.mode == TransponderMode::Standby {
            Self::Standby
        } else if ac.squawk == Squawk::VFR {
            Self::Vfr
        } else if let Some(controller) = &ac.tracking_controller {
            Self::Tracked(controller.symbol.unwrap_or('?'))
        } else {
            Self::Untracked
        }
    }
}

/// Blend factor towards the background for history sample `i` (1 is the
/// newest) of `drawn` samples: 0 for the newest, 0.5 for the oldest.
#[must_use]
pub fn history_fade(i: usize, drawn: usize) -> f32 {
    let i = i.max(1);
    // Epsilon keeps a single-sample trail finite.
    (i - 1) as f32 / (1e-6 + (2 * drawn.saturating_sub(1)) as f32)
}

/// The newest `drawn` history positions with their fade factors.
#[must_use]
pub fn history_trail(ac: &AircraftSnapshot, drawn: usize) -> Vec<(LatLong, f32)> {
    let n = drawn.min(ac.history.len());
    ac.history
        .iter()
        .take(n)
        .enumerate()
        .map(|(k, p)| (*p, history_fade(k + 1, n)))
        .collect()
}

/// How far ahead a vector line reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VectorLineMode {
    /// A fixed length in nautical miles.
    #[default]
    Nm,
    /// Where the aircraft will be after a number of minutes.
    Minutes,
}

impl FromStr for VectorLineMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nm" => Ok(Self::Nm),
            "minutes" | "min" => Ok(Self::Minutes),
            _ => Err(ConfigError::UnknownVectorLineMode(s.to_string())),
        }
    }
}

impl fmt::Display for VectorLineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nm => "nm",
            Self::Minutes => "minutes",
        })
    }
}

/// Geographic end of the vector line, or `None` without a usable ground
/// vector.
#[must_use]
pub fn vector_line_end(ac: &AircraftSnapshot, mode: VectorLineMode, extent: f64) -> Option<LatLong> {
    let v = &ac.ground_vector;
    if !v.is_usable() {
        return None;
    }
    match mode {
        VectorLineMode::Nm => {
            let scale = extent / v.speed_kt();
            Some(ac.position.offset_nm(v.east_kt * scale, v.north_kt * scale))
        }
        VectorLineMode::Minutes => Some(v.extrapolate(&ac.position, extent * 60.0)),
    }
}

/// Vector line in window coordinates, pulled back from the track symbol when
/// long enough.
#[must_use]
pub fn window_vector_line(
    projector: &dyn Projector,
    ac: &AircraftSnapshot,
    mode: VectorLineMode,
    extent: f64,
) -> Option<(Vec2, Vec2)> {
    let end = projector.window_from_latlong(&vector_line_end(ac, mode, extent)?);
    let mut start = projector.window_from_latlong(&ac.position);
    let v = end - start;
    if v.length() > VECTOR_LINE_CLEARANCE_MIN {
        start += v.normalize() * VECTOR_LINE_CLEARANCE;
    }
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::{AircraftId, TrackingController};
    use crate::geo::{nm_distance, GroundVector};
    use crate::projection::ScopeProjection;

    fn aircraft() -> AircraftSnapshot {
        let mut ac = AircraftSnapshot::new(AircraftId::new("A"), "N123", LatLong::new(40.0, -74.0));
        ac.ground_vector = GroundVector::from_track(90.0, 120.0);
        ac.squawk = Squawk(0o4321);
        ac
    }

    #[test]
    fn test_symbol_precedence() {
        let mut ac = aircraft();
        assert_eq!(TrackSymbol::for_aircraft(&ac), TrackSymbol::Untracked);
        ac.tracking_controller = Some(TrackingController {
            callsign: "N90".to_string(),
            symbol: None,
        });
        assert_eq!(TrackSymbol::for_aircraft(&ac), TrackSymbol::Tracked('?'));
        ac.squawk = Squawk::VFR;
        assert_eq!(TrackSymbol::for_aircraft(&ac), TrackSymbol::Vfr);
        ac.mode = TransponderMode::Standby;
        assert_eq!(TrackSymbol::for_aircraft(&ac), TrackSymbol::Standby);
    }

    #[test]
    fn test_history_fade() {
        assert!(history_fade(1, 1).abs() < 1e-6);
        assert!(history_fade(1, 5).abs() < 1e-6);
        assert!((history_fade(5, 5) - 0.5).abs() < 1e-4);

        let mut ac = aircraft();
        ac.history = vec![LatLong::new(40.0, -74.01), LatLong::new(40.0, -74.02)];
        let trail = history_trail(&ac, 5);
        assert_eq!(trail.len(), 2);
        assert!((trail[1].1 - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_vector_line_modes() {
        let ac = aircraft();
        let nm = vector_line_end(&ac, VectorLineMode::Nm, 3.0).unwrap();
        assert!((nm_distance(&ac.position, &nm) - 3.0).abs() < 1e-6);

        // 120 kt for two minutes is 4 nm.
        let min = vector_line_end(&ac, VectorLineMode::Minutes, 2.0).unwrap();
        assert!((nm_distance(&ac.position, &min) - 4.0).abs() < 1e-6);

        let mut still = aircraft();
        still.ground_vector = GroundVector::default();
        assert!(vector_line_end(&still, VectorLineMode::Nm, 3.0).is_none());
    }

    #[test]
    fn test_parse_vector_mode() {
        assert_eq!("NM".parse::<VectorLineMode>(), Ok(VectorLineMode::Nm));
        assert_eq!("minutes".parse::<VectorLineMode>(), Ok(VectorLineMode::Minutes));
        assert!("furlongs".parse::<VectorLineMode>().is_err());
    }

    #[test]
    fn test_window_line_clears_symbol() {
        let ac = aircraft();
        let proj = ScopeProjection::new(ac.position, 10.0, 200.0, 200.0);
        let (start, end) = window_vector_line(&proj, &ac, VectorLineMode::Nm, 2.0).unwrap();
        let track = proj.window_from_latlong(&ac.position);
        assert!((start.distance(track) - 6.0).abs() < 1e-3);
        assert!(end.x > start.x);
    }
}
