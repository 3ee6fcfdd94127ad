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

//! Datablock text, bounds and presentation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};

use crate::aircraft::AircraftSnapshot;
use crate::error::ConfigError;
use crate::geometry::{Extent2D, Vec2};

/// Flash period used when the configured one is unusable.
pub const DEFAULT_FLASH_PERIOD_SECS: u32 = 3;

/// Which fields a datablock shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelFormat {
    None,
    Simple,
    Ground,
    Tower,
    #[default]
    Full,
}

impl FromStr for LabelFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "simple" => Ok(Self::Simple),
            "ground" => Ok(Self::Ground),
            "tower" => Ok(Self::Tower),
            "full" => Ok(Self::Full),
            _ => Err(ConfigError::UnknownLabelFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LabelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Simple => "simple",
            Self::Ground => "ground",
            Self::Tower => "tower",
            Self::Full => "full",
        };
        f.write_str(name)
    }
}

impl LabelFormat {
    /// Text of flash cycle `cycle` (0 or 1), without the handoff line.
    #[must_use]
    pub fn format(self, ac: &AircraftSnapshot, duplicate_squawk: bool, cycle: usize) -> String {
        if self == Self::None {
            return String::new();
        }

        let mut ident = ac.callsign.clone();
        if duplicate_squawk {
            ident.push_str(&format!(" DUP {}", ac.squawk));
        }

        match self {
            Self::None => String::new(),
            Self::Simple => ident,
            Self::Ground => format!("{ident}\n{}", ac.aircraft_type.as_deref().unwrap_or("")),
            Self::Tower => format!("{ident}\n{}", altitude_speed(ac)),
            Self::Full if cycle % 2 == 0 => format!("{ident}\n{}", altitude_speed(ac)),
            Self::Full => {
                let dest = ac.destination.as_deref().unwrap_or("");
                let kind = ac.aircraft_type.as_deref().unwrap_or("");
                format!("{ident}\n{}", format!("{dest} {kind}").trim())
            }
        }
    }
}

/// `ALT GS`: altitude in hundreds of feet and ground speed in tens of knots.
fn altitude_speed(ac: &AircraftSnapshot) -> String {
    let hundreds = (ac.altitude.max(0) + 50) / 100;
    let tens = (ac.ground_vector.speed_kt() / 10.0).round() as i64;
    format!("{hundreds:03} {tens:02}")
}

/// The line listing controllers involved in a handoff or point-out, if any.
#[must_use]
pub fn handoff_line(
    inbound: Option<&str>,
    outbound: Option<&str>,
    pointed_out_by: Option<&str>,
) -> Option<String> {
    let mut line = String::new();
    for (marker, controller) in [('<', inbound), ('>', outbound), ('!', pointed_out_by)] {
        if let Some(controller) = controller.filter(|c| !c.is_empty()) {
            line.push(marker);
            line.push_str(controller);
        }
    }
    (!line.is_empty()).then_some(line)
}

/// Font metrics for label text.
pub trait TextMeasurer {
    /// Width and height of `text`, which may span several lines.
    fn measure(&self, text: &str) -> (f32, f32);
}

/// Monospaced measurement: every character is one cell.
#[derive(Debug, Clone, Copy)]
pub struct FixedCellMeasurer {
    pub char_width: f32,
    pub line_height: f32,
}

impl Default for FixedCellMeasurer {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 14.0,
        }
    }
}

impl TextMeasurer for FixedCellMeasurer {
    fn measure(&self, text: &str) -> (f32, f32) {
        let mut lines = 0usize;
        let mut widest = 0usize;
        for line in text.lines() {
            lines += 1;
            widest = widest.max(line.chars().count());
        }
        (widest as f32 * self.char_width, lines as f32 * self.line_height)
    }
}

/// Label bounds relative to the upper-left corner, large enough for both
/// flash cycles.
#[must_use]
pub fn label_box(measurer: &dyn TextMeasurer, text: &[String; 2]) -> Extent2D {
    let (w0, h0) = measurer.measure(&text[0]);
    let (w1, h1) = measurer.measure(&text[1]);
    Extent2D::new(Vec2::new(0.0, -h0.max(h1)), Vec2::new(w0.max(w1), 0.0))
}

/// Which of the two label texts is shown at `now`.
#[must_use]
pub fn flash_index(now: DateTime<Utc>, period_secs: u32) -> usize {
    let period = if period_secs == 0 {
        DEFAULT_FLASH_PERIOD_SECS
    } else {
        period_secs
    };
    ((now.second() / period) & 1) as usize
}

/// Pull `x` to the nearest end of `[a, b]`, or to the middle if it is inside.
fn snap(x: f32, a: f32, b: f32) -> f32 {
    if x < a {
        a
    } else if x > b {
        b
    } else {
        (a + b) / 2.0
    }
}

/// Where the leader line from `track` meets `bounds`, or `None` if the track
/// lies inside the label.
#[must_use]
pub fn leader_line_end(bounds: &Extent2D, track: Vec2) -> Option<Vec2> {
    if track.y < bounds.p0.y {
        Some(Vec2::new(snap(track.x, bounds.p0.x, bounds.p1.x), bounds.p0.y))
    } else if track.y > bounds.p1.y {
        Some(Vec2::new(snap(track.x, bounds.p0.x, bounds.p1.x), bounds.p1.y))
    } else if track.x < bounds.p0.x {
        Some(Vec2::new(bounds.p0.x, snap(track.y, bounds.p0.y, bounds.p1.y)))
    } else if track.x > bounds.p1.x {
        Some(Vec2::new(bounds.p1.x, snap(track.y, bounds.p0.y, bounds.p1.y)))
    } else {
        None
    }
}

/// Presentation class of a datablock; the renderer maps it to a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    Ghost,
    Selected,
    HandingOff,
    /// Tracked by this scope's controller.
    Tracked,
    Untracked,
}

impl LabelStyle {
    #[must_use]
    pub fn for_aircraft(
        ac: &AircraftSnapshot,
        is_ghost: bool,
        selected: bool,
        own_callsign: Option<&str>,
    ) -> Self {
        if is_ghost {
            Self::Ghost
        } else if selected {
            Self::Selected
        } else if ac.inbound_handoff.is_some() || ac.outbound_handoff.is_some() {
            Self::HandingOff
        } else if own_callsign.is_some_and(|own| {
            ac.tracking_controller
                .as_ref()
                .is_some_and(|c| c.callsign == own)
        }) {
            Self::Tracked
        } else {
            Self::Untracked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::{AircraftId, Squawk, TrackingController};
    use crate::geo::{GroundVector, LatLong};
    use chrono::TimeZone;

    fn aircraft() -> AircraftSnapshot {
        let mut ac = AircraftSnapshot::new(AircraftId::new("A"), "UAL123", LatLong::new(40.0, -74.0));
        ac.altitude = 12_340;
        ac.ground_vector = GroundVector::from_track(90.0, 254.0);
        ac.destination = Some("KEWR".to_string());
        ac.aircraft_type = Some("B738".to_string());
        ac.squawk = Squawk(0o4521);
        ac
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("Tower".parse::<LabelFormat>(), Ok(LabelFormat::Tower));
        assert_eq!(" none ".parse::<LabelFormat>(), Ok(LabelFormat::None));
        assert_eq!(
            "fancy".parse::<LabelFormat>(),
            Err(ConfigError::UnknownLabelFormat("fancy".to_string()))
        );
    }

    #[test]
    fn test_full_format_alternates() {
        let ac = aircraft();
        assert_eq!(LabelFormat::Full.format(&ac, false, 0), "UAL123\n123 25");
        assert_eq!(LabelFormat::Full.format(&ac, false, 1), "UAL123\nKEWR B738");
        assert_eq!(LabelFormat::Tower.format(&ac, false, 1), "UAL123\n123 25");
        assert_eq!(LabelFormat::Ground.format(&ac, false, 0), "UAL123\nB738");
        assert_eq!(LabelFormat::Simple.format(&ac, true, 0), "UAL123 DUP 4521");
        assert_eq!(LabelFormat::None.format(&ac, true, 0), "");
    }

    #[test]
    fn test_handoff_line() {
        assert_eq!(handoff_line(None, None, None), None);
        assert_eq!(
            handoff_line(Some("N90"), None, Some("ZNY")),
            Some("<N90!ZNY".to_string())
        );
        assert_eq!(handoff_line(None, Some("EWR_TWR"), None), Some(">EWR_TWR".to_string()));
    }

    #[test]
    fn test_label_box_covers_both_cycles() {
        let m = FixedCellMeasurer {
            char_width: 10.0,
            line_height: 12.0,
        };
        let text = ["AB\nC".to_string(), "ABCD".to_string()];
        let b = label_box(&m, &text);
        assert_eq!(b, Extent2D::new(Vec2::new(0.0, -24.0), Vec2::new(40.0, 0.0)));
    }

    #[test]
    fn test_flash_index() {
        let t = |s| Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, s).unwrap();
        assert_eq!(flash_index(t(0), 3), 0);
        assert_eq!(flash_index(t(3), 3), 1);
        assert_eq!(flash_index(t(7), 3), 0);
        assert_eq!(flash_index(t(4), 0), 1);
    }

    #[test]
    fn test_leader_line_end() {
        let b = Extent2D::new(Vec2::new(10.0, 10.0), Vec2::new(50.0, 30.0));
        // Below and left of the box: clamped to the lower-left corner.
        assert_eq!(leader_line_end(&b, Vec2::new(0.0, 0.0)), Some(Vec2::new(10.0, 10.0)));
        // Below, horizontally within: bottom edge midpoint.
        assert_eq!(leader_line_end(&b, Vec2::new(20.0, 0.0)), Some(Vec2::new(30.0, 10.0)));
        // Left, vertically within: left edge midpoint.
        assert_eq!(leader_line_end(&b, Vec2::new(0.0, 12.0)), Some(Vec2::new(10.0, 20.0)));
        assert_eq!(leader_line_end(&b, Vec2::new(20.0, 20.0)), None);
    }

    #[test]
    fn test_label_style_precedence() {
        let mut ac = aircraft();
        assert_eq!(LabelStyle::for_aircraft(&ac, false, false, Some("N90")), LabelStyle::Untracked);

        ac.tracking_controller = Some(TrackingController {
            callsign: "N90".to_string(),
            symbol: Some('N'),
        });
        assert_eq!(LabelStyle::for_aircraft(&ac, false, false, Some("N90")), LabelStyle::Tracked);
        assert_eq!(LabelStyle::for_aircraft(&ac, false, false, None), LabelStyle::Untracked);

        ac.outbound_handoff = Some("ZNY".to_string());
        assert_eq!(LabelStyle::for_aircraft(&ac, false, false, Some("N90")), LabelStyle::HandingOff);
        assert_eq!(LabelStyle::for_aircraft(&ac, false, true, Some("N90")), LabelStyle::Selected);
        assert_eq!(LabelStyle::for_aircraft(&ac, true, true, Some("N90")), LabelStyle::Ghost);
    }
}
