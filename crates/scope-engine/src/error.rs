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

use thiserror::Error;

use crate::aircraft::{AircraftId, FlightRules};

/// Problems found in a scope configuration.
///
/// None of these stop a frame from being drawn: each one falls back to a
/// default and is kept on the display as a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown label format '{0}', using full datablocks")]
    UnknownLabelFormat(String),

    #[error("unknown vector line mode '{0}', vector lines disabled")]
    UnknownVectorLineMode(String),

    #[error("minimum altitude {min} is above maximum altitude {max}, filter swapped")]
    InvertedAltitudeFilter { min: i32, max: i32 },

    #[error("label flash period of zero seconds, using 3")]
    ZeroFlashPeriod,

    #[error("{rules:?} violation limits exceed warning limits")]
    InvalidRangeLimits { rules: FlightRules },
}

/// Something a display had to skip or replace while running; kept so the
/// owner can surface it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("in-trail sequence names aircraft {0}, which is not in the snapshot")]
    UnknownSequenceAircraft(AircraftId),

    #[error("no location known for arrival airport {0}")]
    UnknownAirport(String),
}
