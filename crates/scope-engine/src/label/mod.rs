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

//! Aircraft labels (datablocks): text, anchoring and layout.

pub mod anchor;
pub mod datablock;
pub mod placement;

pub use anchor::{ideal_offset, Anchor};
pub use datablock::{
    flash_index, handoff_line, label_box, leader_line_end, FixedCellMeasurer, LabelFormat,
    LabelStyle, TextMeasurer,
};
pub use placement::{LabelCandidate, LabelPlacer, PlacementReport};
