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

//! Geographic <-> window coordinate projection.
//!
//! The engine only ever talks to a [`Projector`]; the renderer that owns the
//! real viewing transforms supplies its own implementation. [`ScopeProjection`]
//! is a plain centered, rotated projection used by the replay driver and tests.

use crate::geo::LatLong;
use crate::geometry::Vec2;

/// Opaque pair of geo <-> window transforms for one frame.
pub trait Projector {
    fn window_from_latlong(&self, p: &LatLong) -> Vec2;
    fn latlong_from_window(&self, p: Vec2) -> LatLong;
}

/// Scope-centered projection: `range_nm` nautical miles from the center fill
/// half of the smaller viewport dimension, rotated clockwise by
/// `rotation_deg`.
#[derive(Debug, Clone, Copy)]
pub struct ScopeProjection {
    pub center: LatLong,
    pub range_nm: f32,
    pub width: f32,
    pub height: f32,
    pub rotation_deg: f32,
}

impl ScopeProjection {
    #[must_use]
    pub fn new(center: LatLong, range_nm: f32, width: f32, height: f32) -> Self {
        Self {
            center,
            range_nm,
            width,
            height,
            rotation_deg: 0.0,
        }
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation_deg: f32) -> Self {
        self.rotation_deg = rotation_deg;
        self
    }

    /// Window units per nautical mile.
    #[must_use]
    pub fn pixels_per_nm(&self) -> f32 {
        let half = self.width.min(self.height) / 2.0;
        half / self.range_nm.max(f32::EPSILON)
    }

    fn window_center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Projector for ScopeProjection {
    fn window_from_latlong(&self, p: &LatLong) -> Vec2 {
        let (east, north) = self.center.nm_delta_to(p);
        let (sin, cos) = f64::from(self.rotation_deg).to_radians().sin_cos();
        let x = east * cos + north * sin;
        let y = north * cos - east * sin;
        let scale = self.pixels_per_nm();
        self.window_center() + Vec2::new(x as f32 * scale, y as f32 * scale)
    }

    fn latlong_from_window(&self, p: Vec2) -> LatLong {
        let scale = self.pixels_per_nm();
        let v = p - self.window_center();
        let (x, y) = (f64::from(v.x / scale), f64::from(v.y / scale));
        let (sin, cos) = f64::from(self.rotation_deg).to_radians().sin_cos();
        let east = x * cos - y * sin;
        let north = x * sin + y * cos;
        self.center.offset_nm(east, north)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_maps_to_middle() {
        let proj = ScopeProjection::new(LatLong::new(37.6, -122.4), 20.0, 800.0, 600.0);
        let p = proj.window_from_latlong(&proj.center);
        assert_eq!(p, Vec2::new(400.0, 300.0));
        assert!((proj.pixels_per_nm() - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_north_is_up_until_rotated() {
        let center = LatLong::new(37.6, -122.4);
        let north = center.offset_nm(0.0, 10.0);

        let proj = ScopeProjection::new(center, 20.0, 800.0, 800.0);
        let p = proj.window_from_latlong(&north);
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 600.0).abs() < 1e-3);

        // Rotating the scope 90 degrees puts north on the right.
        let rotated = proj.with_rotation(90.0);
        let p = rotated.window_from_latlong(&north);
        assert!((p.x - 600.0).abs() < 1e-2);
        assert!((p.y - 400.0).abs() < 1e-2);
    }

    #[test]
    fn test_inverse_projection() {
        let proj = ScopeProjection::new(LatLong::new(37.6, -122.4), 20.0, 800.0, 600.0)
            .with_rotation(33.0);
        let p = LatLong::new(37.7, -122.3);
        let back = proj.latlong_from_window(proj.window_from_latlong(&p));
        assert!((back.lat - p.lat).abs() < 1e-4);
        assert!((back.lon - p.lon).abs() < 1e-4);
    }
}
