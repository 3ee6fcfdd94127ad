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

//! Ghost aircraft for converging-runway operations.
//!
//! An aircraft established on the approach to one runway is mirrored onto the
//! approach of a converging runway so the controller can stagger arrivals to
//! both. The mirrored aircraft is a separate snapshot with its own identity.

use serde::{Deserialize, Serialize};

use crate::aircraft::AircraftSnapshot;
use crate::geo::{heading_between, heading_difference, nm_distance, normalize_heading, GroundVector, LatLong};

/// Produces the ghost of an aircraft, if it should have one.
pub trait GhostProjector {
    /// The returned snapshot's id is replaced with `source.id.ghost()` by the
    /// caller, so implementations need not set it.
    fn ghost_of(&self, source: &AircraftSnapshot) -> Option<AircraftSnapshot>;
}

/// Rotates aircraft on the source runway's approach about the runways'
/// intersection onto the destination runway's approach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergingRunwayGhosts {
    pub intersection: LatLong,
    /// Final approach course of the source runway, degrees true.
    pub source_course: f64,
    /// Final approach course of the destination runway, degrees true.
    pub destination_course: f64,
    /// Maximum difference between aircraft heading and the source course.
    #[serde(default = "default_heading_tolerance")]
    pub heading_tolerance: f64,
    /// Half-angle of the approach cone measured at the intersection.
    #[serde(default = "default_lateral_spread")]
    pub lateral_spread: f64,
    #[serde(default = "default_max_distance_nm")]
    pub max_distance_nm: f64,
}

fn default_heading_tolerance() -> f64 {
    110.0
}

fn default_lateral_spread() -> f64 {
    10.0
}

fn default_max_distance_nm() -> f64 {
    25.0
}

impl ConvergingRunwayGhosts {
    #[must_use]
    pub fn new(intersection: LatLong, source_course: f64, destination_course: f64) -> Self {
        Self {
            intersection,
            source_course,
            destination_course,
            heading_tolerance: default_heading_tolerance(),
            lateral_spread: default_lateral_spread(),
            max_distance_nm: default_max_distance_nm(),
        }
    }

    fn rotation(&self) -> f64 {
        self.destination_course - self.source_course
    }
}

/// Rotate an (east, north) vector clockwise by `degrees`.
fn rotate(east: f64, north: f64, degrees: f64) -> (f64, f64) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    (east * cos + north * sin, north * cos - east * sin)
}

impl GhostProjector for ConvergingRunwayGhosts {
    fn ghost_of(&self, source: &AircraftSnapshot) -> Option<AircraftSnapshot> {
        if source.lost_track {
            return None;
        }
        if nm_distance(&self.intersection, &source.position) > self.max_distance_nm {
            return None;
        }
        if heading_difference(source.heading, self.source_course) > self.heading_tolerance {
            return None;
        }
        // Inbound traffic sits on the reciprocal of the approach course.
        let bearing = heading_between(&self.intersection, &source.position, 0.0);
        let reciprocal = normalize_heading(self.source_course + 180.0);
        if heading_difference(bearing, reciprocal) > self.lateral_spread {
            return None;
        }

        let angle = self.rotation();
        let (east, north) = self.intersection.nm_delta_to(&source.position);
        let (east, north) = rotate(east, north, angle);
        let (vx, vy) = rotate(source.ground_vector.east_kt, source.ground_vector.north_kt, angle);

        let mut ghost = source.clone();
        ghost.id = source.id.ghost();
        ghost.position = self.intersection.offset_nm(east, north);
        ghost.heading = normalize_heading(source.heading + angle);
        ghost.ground_vector = GroundVector::new(vx, vy);
        // Ghost history would trail the real aircraft, not the ghost.
        ghost.history.clear();
        Some(ghost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::AircraftId;

    fn crda() -> ConvergingRunwayGhosts {
        // Runway 28 approach (course 280) converging with runway 19 (course 190).
        ConvergingRunwayGhosts::new(LatLong::new(37.62, -122.38), 280.0, 190.0)
    }

    fn inbound(distance_nm: f64, heading: f64) -> AircraftSnapshot {
        let center = LatLong::new(37.62, -122.38);
        // On the reciprocal of 280, i.e. bearing 100 from the intersection.
        let (sin, cos) = 100_f64.to_radians().sin_cos();
        let mut ac = AircraftSnapshot::new(
            AircraftId::new("ABC"),
            "UAL1",
            center.offset_nm(distance_nm * sin, distance_nm * cos),
        );
        ac.heading = heading;
        ac.ground_vector = GroundVector::from_track(heading, 150.0);
        ac
    }

    #[test]
    fn test_ghost_is_rotated_onto_other_approach() {
        let ac = inbound(8.0, 280.0);
        let ghost = crda().ghost_of(&ac).unwrap();
        assert_eq!(ghost.id, ac.id.ghost());
        assert!((ghost.heading - 190.0).abs() < 1e-9);

        let ix = LatLong::new(37.62, -122.38);
        assert!((nm_distance(&ix, &ghost.position) - 8.0).abs() < 0.05);
        // Reciprocal of 190 is 010.
        let bearing = heading_between(&ix, &ghost.position, 0.0);
        assert!(heading_difference(bearing, 10.0) < 0.5);
    }

    #[test]
    fn test_no_ghost_outside_approach() {
        assert!(crda().ghost_of(&inbound(40.0, 280.0)).is_none());
        assert!(crda().ghost_of(&inbound(8.0, 90.0)).is_none());

        let mut lost = inbound(8.0, 280.0);
        lost.lost_track = true;
        assert!(crda().ghost_of(&lost).is_none());
    }
}
