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

//! Heading-based choice of where a label attaches to its track.

use crate::geo::normalize_heading;
use crate::geometry::{Extent2D, Vec2};
use crate::state::LABEL_PADDING;

/// Extra distance an edge-midpoint anchor is pushed away from the track.
const EDGE_ANCHOR_NUDGE: f32 = 3.0;

/// Point on the (padded) label box that is placed on the track.
///
/// Right-hand anchors are never used: right-aligned text bounds are ragged,
/// so the measured right edge is not trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    LeftMid,
    UpperLeft,
    TopMid,
    LowerLeft,
    BottomMid,
}

impl Anchor {
    /// Anchor for a track heading as seen on the window (aircraft heading
    /// plus display rotation).
    #[must_use]
    pub fn for_heading(window_heading: f64) -> Self {
        // Shifting by 15 degrees lets the north slice start at zero.
        let h = normalize_heading(window_heading + 15.0);
        if h < 30.0 {
            Self::LeftMid
        } else if h < 90.0 {
            Self::UpperLeft
        } else if h < 120.0 {
            Self::TopMid
        } else if h < 180.0 {
            Self::LowerLeft
        } else if h < 210.0 {
            Self::LeftMid
        } else if h < 270.0 {
            Self::UpperLeft
        } else if h < 300.0 {
            Self::BottomMid
        } else {
            Self::LowerLeft
        }
    }

    #[must_use]
    pub fn is_corner(self) -> bool {
        matches!(self, Self::UpperLeft | Self::LowerLeft)
    }

    /// The anchor's location on `bounds`.
    #[must_use]
    pub fn point(self, bounds: &Extent2D) -> Vec2 {
        let center = bounds.center();
        match self {
            Self::LeftMid => Vec2::new(bounds.p0.x, center.y),
            Self::UpperLeft => Vec2::new(bounds.p0.x, bounds.p1.y),
            Self::TopMid => Vec2::new(center.x, bounds.p1.y),
            Self::LowerLeft => bounds.p0,
            Self::BottomMid => Vec2::new(center.x, bounds.p0.y),
        }
    }
}

/// Offset that moves a label with local bounds `label_box` so its heading
/// anchor lands on the track.
#[must_use]
pub fn ideal_offset(label_box: &Extent2D, heading: f64, rotation: f64) -> Vec2 {
    let padded = label_box.expand(LABEL_PADDING);
    let anchor = Anchor::for_heading(heading + rotation);
    let mut v = -anchor.point(&padded);
    if !anchor.is_corner() {
        v += v.normalize() * EDGE_ANCHOR_NUDGE;
    }
    v
}
