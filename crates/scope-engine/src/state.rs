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

//! Per-aircraft scope state.
//!
//! Each display owns a [`ScopeStore`] mapping [`AircraftId`] to the ephemeral
//! [`ScopeState`] the scope keeps for that aircraft (label offsets, cached
//! label text and bounds). Ghost aircraft get their own entries, linked to
//! their source through a separate ghost table so that a ghost never shares
//! state with the aircraft it was projected from.

use std::collections::HashMap;

use log::debug;

use crate::aircraft::AircraftId;
use crate::geometry::{Extent2D, Vec2};

/// Padding added around label text when testing for overlap.
pub const LABEL_PADDING: f32 = 5.0;

/// Ephemeral per-aircraft display state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeState {
    pub is_ghost: bool,
    /// User-dragged offset; zero means unset.
    pub manual_offset: Vec2,
    pub automatic_offset: Vec2,
    /// Label text for both flash cycles.
    pub label_lines: [String; 2],
    /// Label bounds relative to the label's upper-left corner, so `p1.y == 0`.
    pub label_box: Extent2D,
    pub text_dirty: bool,
}

impl ScopeState {
    #[must_use]
    pub fn tracked() -> Self {
        Self {
            text_dirty: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn ghost() -> Self {
        Self {
            is_ghost: true,
            ..Self::tracked()
        }
    }

    #[must_use]
    pub fn has_manual_offset(&self) -> bool {
        !self.manual_offset.is_zero()
    }

    /// The offset actually in effect: manual if set, automatic otherwise.
    #[must_use]
    pub fn effective_offset(&self) -> Vec2 {
        if self.has_manual_offset() {
            self.manual_offset
        } else {
            self.automatic_offset
        }
    }

    /// Unpadded label bounds in window coordinates for a track at `track`.
    #[must_use]
    pub fn window_label_bounds(&self, track: Vec2) -> Extent2D {
        self.label_box.offset(track + self.effective_offset())
    }

    /// Label bounds including [`LABEL_PADDING`], as used for overlap tests.
    #[must_use]
    pub fn padded_label_bounds(&self, track: Vec2) -> Extent2D {
        self.window_label_bounds(track).expand(LABEL_PADDING)
    }
}

/// Id-keyed store of [`ScopeState`] plus the source -> ghost links.
#[derive(Debug, Default)]
pub struct ScopeStore {
    states: HashMap<AircraftId, ScopeState>,
    ghosts: HashMap<AircraftId, AircraftId>,
}

impl ScopeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `id`, replacing any existing state.
    pub fn insert(&mut self, id: AircraftId) {
        self.states.insert(id, ScopeState::tracked());
    }

    /// Create a ghost state for `ghost` linked to `source`. Any previous ghost
    /// of `source` is dropped first.
    pub fn link_ghost(&mut self, source: &AircraftId, ghost: AircraftId) {
        debug_assert!(*source != ghost, "a ghost must not share its source's identity");
        self.unlink_ghost(source);
        self.states.insert(ghost.clone(), ScopeState::ghost());
        self.ghosts.insert(source.clone(), ghost);
    }

    /// Drop the ghost linked to `source`, if any, returning its id.
    pub fn unlink_ghost(&mut self, source: &AircraftId) -> Option<AircraftId> {
        let ghost = self.ghosts.remove(source)?;
        self.states.remove(&ghost);
        Some(ghost)
    }

    /// Stop tracking `id` together with its ghost.
    pub fn remove(&mut self, id: &AircraftId) -> Option<ScopeState> {
        if let Some(ghost) = self.unlink_ghost(id) {
            debug!("Removed ghost {ghost} along with {id}");
        }
        self.states.remove(id)
    }

    /// Flag the label text of `id` for regeneration, creating the state if
    /// the aircraft was not tracked yet.
    pub fn mark_modified(&mut self, id: &AircraftId) {
        match self.states.get_mut(id) {
            Some(state) => state.text_dirty = true,
            None => self.insert(id.clone()),
        }
    }

    /// Flag every label for regeneration, e.g. after a format change.
    pub fn mark_all_dirty(&mut self) {
        for state in self.states.values_mut() {
            state.text_dirty = true;
        }
    }

    #[must_use]
    pub fn get(&self, id: &AircraftId) -> Option<&ScopeState> {
        self.states.get(id)
    }

    pub fn get_mut(&mut self, id: &AircraftId) -> Option<&mut ScopeState> {
        self.states.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &AircraftId) -> bool {
        self.states.contains_key(id)
    }

    #[must_use]
    pub fn ghost_of(&self, source: &AircraftId) -> Option<&AircraftId> {
        self.ghosts.get(source)
    }

    /// Source -> ghost links.
    pub fn ghost_links(&self) -> impl Iterator<Item = (&AircraftId, &AircraftId)> {
        self.ghosts.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AircraftId, &ScopeState)> {
        self.states.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.ghosts.clear();
    }

    /// Independent deep copy. Ghost entries are rebuilt from the link table
    /// rather than copied wholesale, so every ghost in the copy has exactly
    /// one source.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let mut dupe = Self::new();
        for (id, state) in &self.states {
            if !state.is_ghost {
                dupe.states.insert(id.clone(), state.clone());
            }
        }
        for (source, ghost) in &self.ghosts {
            let state = self
                .states
                .get(ghost)
                .cloned()
                .unwrap_or_else(ScopeState::ghost);
            dupe.states.insert(ghost.clone(), state);
            dupe.ghosts.insert(source.clone(), ghost.clone());
        }
        dupe
    }
}
