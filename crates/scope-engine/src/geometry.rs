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

//! Window-space geometry primitives.
//!
//! Window coordinates have their origin at the lower-left corner of the scope
//! with y pointing up, so an [`Extent2D`]'s `p0` is its lower-left corner and
//! `p1` its upper-right corner.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A 2D vector or point in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or zero for a zero-length (or
    /// non-finite) vector rather than NaN.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    /// Scale the vector down so its length does not exceed `max`.
    #[must_use]
    pub fn clamp_length(self, max: f32) -> Self {
        let len = self.length();
        if len > max {
            self * (max / len)
        } else {
            self
        }
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Extent2D {
    /// Lower-left corner.
    pub p0: Vec2,
    /// Upper-right corner.
    pub p1: Vec2,
}

impl Extent2D {
    #[must_use]
    pub const fn new(p0: Vec2, p1: Vec2) -> Self {
        Self { p0, p1 }
    }

    /// Extent covering `(0,0)..(width,height)`.
    #[must_use]
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.p1.x - self.p0.x
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.p1.y - self.p0.y
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.p0.midpoint(self.p1)
    }

    /// Translate the extent by `v`.
    #[must_use]
    pub fn offset(&self, v: Vec2) -> Self {
        Self::new(self.p0 + v, self.p1 + v)
    }

    /// Grow the extent by `d` on every side.
    #[must_use]
    pub fn expand(&self, d: f32) -> Self {
        Self::new(
            Vec2::new(self.p0.x - d, self.p0.y - d),
            Vec2::new(self.p1.x + d, self.p1.y + d),
        )
    }

    /// Inclusive overlap test: extents that share an edge overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let x = self.p1.x >= other.p0.x && self.p0.x <= other.p1.x;
        let y = self.p1.y >= other.p0.y && self.p0.y <= other.p1.y;
        x && y
    }

    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.p0.x && p.x <= self.p1.x && p.y >= self.p0.y && p.y <= self.p1.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
        let n = Vec2::new(3.0, 4.0).normalize();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_length() {
        let v = Vec2::new(60.0, 80.0).clamp_length(32.0);
        assert!((v.length() - 32.0).abs() < 1e-4);
        assert_eq!(Vec2::new(1.0, 1.0).clamp_length(32.0), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_overlaps_is_inclusive() {
        let a = Extent2D::from_size(10.0, 10.0);
        let touching = a.offset(Vec2::new(10.0, 0.0));
        let apart = a.offset(Vec2::new(10.5, 0.0));
        assert!(a.overlaps(&touching));
        assert!(!a.overlaps(&apart));
        assert!(a.overlaps(&a.expand(-2.0)));
    }

    #[test]
    fn test_expand_and_center() {
        let e = Extent2D::new(Vec2::new(0.0, -20.0), Vec2::new(40.0, 0.0)).expand(5.0);
        assert_eq!(e.p0, Vec2::new(-5.0, -25.0));
        assert_eq!(e.p1, Vec2::new(45.0, 5.0));
        assert_eq!(e.center(), Vec2::new(20.0, -10.0));
    }
}
