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

//! Per-frame engine behind a radar scope.
//!
//! This crate decides where aircraft labels (datablocks) go so they do not
//! cover each other, flags aircraft pairs that are losing separation, and
//! measures miles-in-trail spacing between arrivals. It does no drawing and
//! no I/O: every frame it is handed a snapshot of the traffic plus a few
//! collaborators (a geo/window projection, text metrics, an optional ghost
//! projector) and returns what should be drawn.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//!
//! use chrono::Utc;
//! use scope_engine::{
//!     AircraftId, AircraftSnapshot, EventBus, FixedCellMeasurer, FrameInput, LatLong,
//!     ScopeConfig, ScopeDisplay, ScopeEvent, ScopeProjection, Vec2,
//! };
//!
//! let center = LatLong::new(40.69, -74.17);
//! let traffic = vec![AircraftSnapshot::new(AircraftId::new("A1B2C3"), "UAL123", center)];
//!
//! let bus = EventBus::default();
//! let mut scope = ScopeDisplay::new(ScopeConfig::default());
//! scope.activate(&bus, &[], None);
//! bus.publish(ScopeEvent::Added(AircraftId::new("A1B2C3")));
//!
//! let projection = ScopeProjection::new(center, 20.0, 800.0, 600.0);
//! let measurer = FixedCellMeasurer::default();
//! let airports = HashMap::new();
//! let frame = scope.run_frame(&FrameInput {
//!     now: Utc::now(),
//!     aircraft: &traffic,
//!     viewport: Vec2::new(800.0, 600.0),
//!     rotation: 0.0,
//!     projector: &projection,
//!     measurer: &measurer,
//!     ghosts: None,
//!     airports: &airports,
//!     mit_sequence: &[],
//!     selected: None,
//!     own_callsign: None,
//! });
//! assert_eq!(frame.labels.len(), 1);
//! assert!(frame.placement.settled);
//! ```

pub mod aircraft;
pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod geo;
pub mod geometry;
pub mod ghost;
pub mod label;
pub mod projection;
pub mod proximity;
pub mod state;
pub mod tracks;
pub mod transient;

pub use aircraft::{AircraftId, AircraftSnapshot, FlightRules, Squawk, TrackingController, TransponderMode};
pub use config::{ResolvedSettings, ScopeConfig};
pub use display::{FrameInput, FrameOutput, LabelOutput, ScopeDisplay, TrackOutput};
pub use error::{ConfigError, Diagnostic};
pub use events::{EventBus, EventFeed, ScopeEvent};
pub use geo::{GroundVector, LatLong};
pub use geometry::{Extent2D, Vec2};
pub use ghost::{ConvergingRunwayGhosts, GhostProjector};
pub use label::{FixedCellMeasurer, LabelFormat, LabelStyle, PlacementReport, TextMeasurer};
pub use projection::{Projector, ScopeProjection};
pub use proximity::mit::{MitSpacing, SpacingTier};
pub use proximity::{AircraftPair, Conflict, ConflictLevel, ConflictReport, RangeLimits, RangeLimitsTable};
pub use state::{ScopeState, ScopeStore};
pub use tracks::{TrackSymbol, VectorLineMode};
