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

//! Geographic helpers.
//!
//! Distances use a local planar approximation (nautical miles per degree of
//! latitude is constant, per degree of longitude scales with the cosine of the
//! mean latitude). This is accurate enough for the tens of miles a scope
//! covers and keeps every computation cheap enough to run for all pairs each
//! frame.

use serde::{Deserialize, Serialize};

pub const NM_PER_LATITUDE: f64 = 60.0;

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLong {
    pub lat: f64,
    pub lon: f64,
}

impl LatLong {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }

    /// Move the position by `east_nm`/`north_nm` nautical miles.
    #[must_use]
    pub fn offset_nm(&self, east_nm: f64, north_nm: f64) -> Self {
        Self::new(
            self.lat + north_nm / NM_PER_LATITUDE,
            self.lon + east_nm / nm_per_longitude(self.lat),
        )
    }

    /// Vector from `self` to `other` in nautical miles, as (east, north).
    #[must_use]
    pub fn nm_delta_to(&self, other: &LatLong) -> (f64, f64) {
        let per_lon = nm_per_longitude((self.lat + other.lat) / 2.0);
        (
            (other.lon - self.lon) * per_lon,
            (other.lat - self.lat) * NM_PER_LATITUDE,
        )
    }
}

fn nm_per_longitude(lat: f64) -> f64 {
    // Never let the scale collapse to zero at the poles.
    (NM_PER_LATITUDE * lat.to_radians().cos()).max(1e-6)
}

/// Planar distance in nautical miles between two positions.
#[must_use]
pub fn nm_distance(a: &LatLong, b: &LatLong) -> f64 {
    let (east, north) = a.nm_delta_to(b);
    east.hypot(north)
}

/// Magnetic heading in degrees `[0, 360)` from `from` towards `to`.
#[must_use]
pub fn heading_between(from: &LatLong, to: &LatLong, magnetic_variation: f64) -> f64 {
    let (east, north) = from.nm_delta_to(to);
    normalize_heading(east.atan2(north).to_degrees() + magnetic_variation)
}

/// Wrap a heading into `[0, 360)`.
#[must_use]
pub fn normalize_heading(h: f64) -> f64 {
    let h = h.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

/// Smallest absolute angle between two headings, in `[0, 180]`.
#[must_use]
pub fn heading_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

/// Ground velocity in knots, split into east and north components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroundVector {
    pub east_kt: f64,
    pub north_kt: f64,
}

impl GroundVector {
    #[must_use]
    pub const fn new(east_kt: f64, north_kt: f64) -> Self {
        Self { east_kt, north_kt }
    }

    /// Build from a true track (degrees) and ground speed (knots).
    #[must_use]
    pub fn from_track(track_deg: f64, speed_kt: f64) -> Self {
        let t = track_deg.to_radians();
        Self::new(speed_kt * t.sin(), speed_kt * t.cos())
    }

    #[must_use]
    pub fn speed_kt(&self) -> f64 {
        self.east_kt.hypot(self.north_kt)
    }

    /// A vector is usable once it has a direction; too few radar returns
    /// leave it zero.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.east_kt.is_finite() && self.north_kt.is_finite() && self.speed_kt() > 0.0
    }

    /// Position reached after travelling `seconds` from `from`.
    #[must_use]
    pub fn extrapolate(&self, from: &LatLong, seconds: f64) -> LatLong {
        let hours = seconds / 3600.0;
        from.offset_nm(self.east_kt * hours, self.north_kt * hours)
    }
}

/// Distance between two aircraft after each has flown along its current
/// ground track for `seconds`. `None` when either lacks a usable vector.
#[must_use]
pub fn estimated_future_distance(
    a: (&LatLong, &GroundVector),
    b: (&LatLong, &GroundVector),
    seconds: f64,
) -> Option<f64> {
    if !a.1.is_usable() || !b.1.is_usable() {
        return None;
    }
    let a1 = a.1.extrapolate(a.0, seconds);
    let b1 = b.1.extrapolate(b.0, seconds);
    Some(nm_distance(&a1, &b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nm_distance_along_meridian() {
        let a = LatLong::new(40.0, -74.0);
        let b = LatLong::new(40.0 + 2.9 / 60.0, -74.0);
        assert!((nm_distance(&a, &b) - 2.9).abs() < 1e-9);
    }

    #[test]
    fn test_offset_round_trip() {
        let a = LatLong::new(37.6, -122.4);
        let b = a.offset_nm(3.0, 4.0);
        assert!((nm_distance(&a, &b) - 5.0).abs() < 1e-2);
    }

    #[test]
    fn test_heading_between() {
        let a = LatLong::new(40.0, -74.0);
        assert!(heading_between(&a, &a.offset_nm(0.0, 5.0), 0.0).abs() < 1e-6);
        assert!((heading_between(&a, &a.offset_nm(5.0, 0.0), 0.0) - 90.0).abs() < 1e-3);
        assert!((heading_between(&a, &a.offset_nm(-5.0, 0.0), 0.0) - 270.0).abs() < 1e-3);
        assert!((heading_between(&a, &a.offset_nm(0.0, 5.0), -13.0) - 347.0).abs() < 1e-6);
    }

    #[test]
    fn test_heading_difference_wraps() {
        assert!((heading_difference(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((heading_difference(10.0, 350.0) - 20.0).abs() < 1e-9);
        assert!((heading_difference(0.0, 180.0) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_future_distance_requires_vectors() {
        let a = LatLong::new(40.0, -74.0);
        let b = a.offset_nm(0.0, 5.0);
        let north = GroundVector::from_track(0.0, 240.0);
        assert!(estimated_future_distance((&a, &north), (&b, &GroundVector::default()), 30.0).is_none());

        // Leader 5nm ahead at 120kt, trailer at 240kt: after 30s the gap
        // closes by 1nm.
        let slow = GroundVector::from_track(0.0, 120.0);
        let d = estimated_future_distance((&b, &slow), (&a, &north), 30.0).unwrap();
        assert!((d - 4.0).abs() < 1e-3);
    }
}
