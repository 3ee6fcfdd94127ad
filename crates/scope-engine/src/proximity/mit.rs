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

//! Miles-in-trail spacing between successive arrivals.

use std::collections::HashMap;

use crate::aircraft::{AircraftId, AircraftSnapshot};
use crate::geo::{
    estimated_future_distance, heading_between, heading_difference, nm_distance, normalize_heading, LatLong,
};
use crate::proximity::{AircraftPair, ConflictReport};

/// How far ahead the projected spacing looks.
pub const PROJECTION_SECS: f64 = 30.0;
/// Aircraft further apart than this are never paired automatically.
pub const MAX_TRAIL_DISTANCE_NM: f64 = 20.0;
/// Leader must lie within this angle of the trailer's heading.
pub const MAX_TRAIL_HEADING_DIFFERENCE: f64 = 150.0;
pub const MAX_TRAIL_ALTITUDE_DIFFERENCE: u32 = 3000;

/// Presentation tier of a spacing, by current distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpacingTier {
    /// More than 5 nm.
    Safe,
    /// More than 3 nm, up to 5 nm.
    Caution,
    /// 3 nm or less.
    Danger,
}

impl SpacingTier {
    #[must_use]
    pub fn for_distance(nm: f64) -> Self {
        if nm > 5.0 {
            Self::Safe
        } else if nm > 3.0 {
            Self::Caution
        } else {
            Self::Danger
        }
    }
}

/// Spacing between a leading and a trailing aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct MitSpacing {
    pub leader: AircraftId,
    pub trailer: AircraftId,
    pub leader_position: LatLong,
    pub trailer_position: LatLong,
    pub distance_nm: f64,
    /// Distance after [`PROJECTION_SECS`], if both have usable ground vectors.
    pub projected_nm: Option<f64>,
    pub tier: SpacingTier,
}

impl MitSpacing {
    fn measure(leader: &AircraftSnapshot, trailer: &AircraftSnapshot) -> Self {
        let distance_nm = nm_distance(&leader.position, &trailer.position);
        Self {
            leader: leader.id.clone(),
            trailer: trailer.id.clone(),
            leader_position: leader.position,
            trailer_position: trailer.position,
            distance_nm,
            projected_nm: estimated_future_distance(
                (&leader.position, &leader.ground_vector),
                (&trailer.position, &trailer.ground_vector),
                PROJECTION_SECS,
            ),
            tier: SpacingTier::for_distance(distance_nm),
        }
    }

    /// Overlay text, e.g. `4.2 (3.9) nm`.
    #[must_use]
    pub fn annotation(&self) -> String {
        match self.projected_nm {
            Some(projected) => format!("{:.1} ({projected:.1}) nm", self.distance_nm),
            None => format!("{:.1} nm", self.distance_nm),
        }
    }
}

/// Spacing between consecutive aircraft of a controller-defined sequence,
/// leader first. Pairs flagged in `conflicts` are left out.
#[must_use]
pub fn explicit_spacing(sequence: &[&AircraftSnapshot], conflicts: &ConflictReport) -> Vec<MitSpacing> {
    sequence
        .windows(2)
        .filter(|w| !conflicts.contains(&AircraftPair::new(w[0].id.clone(), w[1].id.clone())))
        .map(|w| MitSpacing::measure(w[0], w[1]))
        .collect()
}

/// Whether `leader` can be the aircraft ahead of `trailer` in the same stream.
/// Heading and bearing are both compared as magnetic.
fn in_trail(leader: &AircraftSnapshot, trailer: &AircraftSnapshot, magnetic_variation: f64) -> bool {
    let bearing = heading_between(&trailer.position, &leader.position, magnetic_variation);
    let heading = normalize_heading(trailer.heading + magnetic_variation);
    heading_difference(heading, bearing) < MAX_TRAIL_HEADING_DIFFERENCE
        && trailer.altitude.abs_diff(leader.altitude) < MAX_TRAIL_ALTITUDE_DIFFERENCE
}

/// Pair every arrival with its nearest plausible predecessor bound for the
/// same airport.
///
/// `arrivals` should hold only aircraft whose destination is one of
/// `airports`; others are ignored. The arrival closest to its airport overall
/// never gets a predecessor. Pairs flagged in `conflicts` are left out.
#[must_use]
pub fn automatic_spacing(
    arrivals: &[&AircraftSnapshot],
    airports: &HashMap<String, LatLong>,
    magnetic_variation: f64,
    conflicts: &ConflictReport,
) -> Vec<MitSpacing> {
    let mut sorted: Vec<(&AircraftSnapshot, &str, f64)> = arrivals
        .iter()
        .filter_map(|ac| {
            let dest = ac.destination.as_deref()?;
            let location = airports.get(dest)?;
            Some((*ac, dest, nm_distance(&ac.position, location)))
        })
        .collect();
    sorted.sort_by(|a, b| a.2.total_cmp(&b.2).then_with(|| a.0.sort_key().cmp(&b.0.sort_key())));

    let mut spacings = Vec::new();
    for (i, &(trailer, dest, _)) in sorted.iter().enumerate().skip(1) {
        let mut closest: Option<&AircraftSnapshot> = None;
        let mut min_distance = MAX_TRAIL_DISTANCE_NM;
        for (j, &(candidate, candidate_dest, _)) in sorted.iter().enumerate() {
            if i == j || candidate_dest != dest {
                continue;
            }
            let distance = nm_distance(&trailer.position, &candidate.position);
            if distance < min_distance && in_trail(candidate, trailer, magnetic_variation) {
                min_distance = distance;
                closest = Some(candidate);
            }
        }

        if let Some(leader) = closest {
            if conflicts.contains(&AircraftPair::new(leader.id.clone(), trailer.id.clone())) {
                continue;
            }
            spacings.push(MitSpacing::measure(leader, trailer));
        }
    }
    spacings
}
