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

//! One radar scope and its per-frame pipeline.
//!
//! A [`ScopeDisplay`] owns the scope state of every aircraft it knows about.
//! Each call to [`ScopeDisplay::run_frame`] drains pending aircraft events,
//! refreshes stale label text, lays out labels, classifies conflicts, measures
//! in-trail spacing and returns everything a renderer needs as a
//! [`FrameOutput`]. Nothing here blocks or draws.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};

use crate::aircraft::{AircraftId, AircraftSnapshot, Squawk};
use crate::config::{ResolvedSettings, ScopeConfig};
use crate::error::Diagnostic;
use crate::events::{EventBus, EventFeed, ScopeEvent};
use crate::geo::LatLong;
use crate::geometry::{Extent2D, Vec2};
use crate::ghost::GhostProjector;
use crate::label::{
    flash_index, handoff_line, label_box, leader_line_end, LabelCandidate, LabelFormat, LabelPlacer,
    LabelStyle, PlacementReport, TextMeasurer,
};
use crate::projection::Projector;
use crate::proximity::mit::{automatic_spacing, explicit_spacing, MitSpacing};
use crate::proximity::{classify_conflicts, AlertClock, ConflictReport};
use crate::state::ScopeStore;
use crate::tracks::{history_trail, window_vector_line, TrackSymbol};
use crate::transient::TransientMap;

/// How long a point-out marker stays on a label.
pub const POINT_OUT_SECS: i64 = 5;
/// Tracks further than this from a click are not picked.
pub const PICK_RADIUS: f32 = 20.0;
/// Tracks this far outside the window still take part in label layout.
pub const LAYOUT_CULL_MARGIN: f32 = 100.0;

/// Everything a frame is computed from.
pub struct FrameInput<'a> {
    pub now: DateTime<Utc>,
    /// Every aircraft the surveillance source currently knows about.
    pub aircraft: &'a [AircraftSnapshot],
    /// Window width and height.
    pub viewport: Vec2,
    /// Display rotation in degrees.
    pub rotation: f64,
    pub projector: &'a dyn Projector,
    pub measurer: &'a dyn TextMeasurer,
    pub ghosts: Option<&'a dyn GhostProjector>,
    /// Known airport locations by identifier.
    pub airports: &'a HashMap<String, LatLong>,
    /// Controller-defined in-trail sequence, leader first. Overrides
    /// automatic in-trail spacing when non-empty.
    pub mit_sequence: &'a [AircraftId],
    pub selected: Option<&'a AircraftId>,
    /// Callsign of the controller working this scope.
    pub own_callsign: Option<&'a str>,
}

impl fmt::Debug for FrameInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameInput")
            .field("now", &self.now)
            .field("aircraft", &self.aircraft.len())
            .field("viewport", &self.viewport)
            .field("rotation", &self.rotation)
            .field("ghosts", &self.ghosts.is_some())
            .field("mit_sequence", &self.mit_sequence)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

/// A label ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelOutput {
    pub id: AircraftId,
    /// Text of the current flash cycle; lines separated by `\n`.
    pub text: String,
    /// Unpadded bounds in window coordinates.
    pub bounds: Extent2D,
    /// Leader line from the track to the label edge.
    pub leader: Option<(Vec2, Vec2)>,
    pub style: LabelStyle,
}

/// A track symbol with its trail and vector line.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackOutput {
    pub id: AircraftId,
    pub position: Vec2,
    pub symbol: TrackSymbol,
    pub is_ghost: bool,
    /// History positions, newest first, with their fade towards the
    /// background.
    pub history: Vec<(Vec2, f32)>,
    pub vector_line: Option<(Vec2, Vec2)>,
}

/// Result of one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    /// In draw order: by callsign, the selected aircraft last.
    pub labels: Vec<LabelOutput>,
    pub tracks: Vec<TrackOutput>,
    pub conflicts: ConflictReport,
    pub mit: Vec<MitSpacing>,
    /// A conflict alert should sound.
    pub alert_fired: bool,
    pub placement: PlacementReport,
}

impl FrameOutput {
    /// The aircraft under window point `p`: a label containing it, else the
    /// nearest track within [`PICK_RADIUS`].
    #[must_use]
    pub fn pick(&self, p: Vec2) -> Option<&AircraftId> {
        if let Some(label) = self.labels.iter().rev().find(|l| l.bounds.contains(p)) {
            return Some(&label.id);
        }
        self.tracks
            .iter()
            .map(|t| (t.position.distance(p), &t.id))
            .filter(|(d, _)| *d < PICK_RADIUS)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }
}

/// A radar scope.
#[derive(Debug)]
pub struct ScopeDisplay {
    config: ScopeConfig,
    settings: ResolvedSettings,
    store: ScopeStore,
    pointed_out: TransientMap<AircraftId, String>,
    alert: AlertClock,
    last_conflicts: ConflictReport,
    feed: Option<EventFeed>,
    diagnostics: Vec<Diagnostic>,
}

impl ScopeDisplay {
    #[must_use]
    pub fn new(config: ScopeConfig) -> Self {
        let mut display = Self {
            settings: ResolvedSettings::default(),
            config: ScopeConfig::default(),
            store: ScopeStore::new(),
            pointed_out: TransientMap::new(),
            alert: AlertClock::default(),
            last_conflicts: ConflictReport::default(),
            feed: None,
            diagnostics: Vec::new(),
        };
        display.set_config(config);
        display
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[must_use]
    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    #[must_use]
    pub fn settings(&self) -> &ResolvedSettings {
        &self.settings
    }

    #[must_use]
    pub fn store(&self) -> &ScopeStore {
        &self.store
    }

    /// Conflicts found by the most recent frame.
    #[must_use]
    pub fn last_conflicts(&self) -> &ConflictReport {
        &self.last_conflicts
    }

    /// Problems encountered so far, each reported once.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.feed.is_some()
    }

    /// Replace the configuration. All label text is regenerated next frame.
    pub fn set_config(&mut self, config: ScopeConfig) {
        let (settings, errors) = config.resolve();
        self.config = config;
        self.settings = settings;
        for e in errors {
            self.record(e.into());
        }
        self.store.mark_all_dirty();
    }

    /// Start receiving events from `bus` and track every aircraft in
    /// `aircraft`.
    pub fn activate(
        &mut self,
        bus: &EventBus,
        aircraft: &[AircraftSnapshot],
        ghosts: Option<&dyn GhostProjector>,
    ) {
        self.feed = Some(bus.subscribe());
        self.populate(aircraft, ghosts);
        info!("Scope '{}' activated with {} aircraft", self.config.name, self.store.len());
    }

    /// Stop receiving events and forget all aircraft.
    pub fn deactivate(&mut self) {
        self.feed = None;
        self.store.clear();
        self.pointed_out = TransientMap::new();
        self.last_conflicts = ConflictReport::default();
        info!("Scope '{}' deactivated", self.config.name);
    }

    /// Change the altitude filter and rebuild the scope state from
    /// `aircraft`.
    pub fn set_altitude_filter(
        &mut self,
        min_altitude: i32,
        max_altitude: i32,
        aircraft: &[AircraftSnapshot],
        ghosts: Option<&dyn GhostProjector>,
    ) {
        let mut config = self.config.clone();
        config.min_altitude = min_altitude;
        config.max_altitude = max_altitude;
        self.set_config(config);
        self.populate(aircraft, ghosts);
    }

    /// Independent copy of this scope, optionally named "<name> Copy". The
    /// copy has its own event subscription.
    #[must_use]
    pub fn duplicate(&self, name_as_copy: bool) -> Self {
        let mut config = self.config.clone();
        if name_as_copy {
            config.name.push_str(" Copy");
        }
        Self {
            config,
            settings: self.settings.clone(),
            store: self.store.duplicate(),
            pointed_out: self.pointed_out.clone(),
            alert: self.alert.clone(),
            last_conflicts: self.last_conflicts.clone(),
            feed: self.feed.as_ref().map(EventFeed::resubscribe),
            diagnostics: self.diagnostics.clone(),
        }
    }

    /// Move a label by `delta`, pinning it where it ends up. Returns false if
    /// the aircraft is unknown.
    pub fn drag_label(&mut self, id: &AircraftId, delta: Vec2) -> bool {
        let Some(state) = self.store.get_mut(id) else {
            return false;
        };
        state.manual_offset = state.automatic_offset + state.manual_offset + delta;
        state.automatic_offset = Vec2::ZERO;
        true
    }

    fn populate(&mut self, aircraft: &[AircraftSnapshot], ghosts: Option<&dyn GhostProjector>) {
        self.store.clear();
        for ac in aircraft.iter().filter(|ac| !ac.id.is_ghost()) {
            self.store.insert(ac.id.clone());
            self.refresh_ghost(ac, ghosts);
        }
    }

    /// Drop the ghost of `ac` and derive a new one if it should have one.
    fn refresh_ghost(&mut self, ac: &AircraftSnapshot, ghosts: Option<&dyn GhostProjector>) {
        self.store.unlink_ghost(&ac.id);
        if !self.settings.draw_ghosts {
            return;
        }
        if let Some(projector) = ghosts {
            if projector.ghost_of(ac).is_some() {
                self.store.link_ghost(&ac.id, ac.id.ghost());
            }
        }
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        if !self.diagnostics.contains(&diagnostic) {
            warn!("Scope '{}': {diagnostic}", self.config.name);
            self.diagnostics.push(diagnostic);
        }
    }

    /// Apply a changelist in order.
    pub fn apply_events(&mut self, events: impl IntoIterator<Item = ScopeEvent>, input: &FrameInput<'_>) {
        let find = |id: &AircraftId| input.aircraft.iter().find(|ac| ac.id == *id);
        let mut applied = 0usize;
        for event in events {
            if event.aircraft().is_ghost() {
                continue;
            }
            match event {
                ScopeEvent::Added(id) => {
                    self.store.insert(id.clone());
                    if let Some(ac) = find(&id) {
                        self.refresh_ghost(ac, input.ghosts);
                    }
                }
                ScopeEvent::Removed(id) => {
                    self.store.remove(&id);
                    self.pointed_out.remove(&id);
                }
                ScopeEvent::Modified(id) => {
                    self.store.mark_modified(&id);
                    if let Some(ac) = find(&id) {
                        self.refresh_ghost(ac, input.ghosts);
                    }
                }
                ScopeEvent::PointOut { id, controller } => {
                    if !self.store.contains(&id) {
                        debug!("Ignoring point out of untracked aircraft {id}");
                        continue;
                    }
                    self.pointed_out.add(
                        id.clone(),
                        controller,
                        input.now,
                        Duration::seconds(POINT_OUT_SECS),
                    );
                    self.store.mark_modified(&id);
                }
            }
            applied += 1;
        }
        if applied > 0 {
            debug!("Scope '{}' applied {applied} events", self.config.name);
        }
    }

    /// Run one frame.
    pub fn run_frame(&mut self, input: &FrameInput<'_>) -> FrameOutput {
        if let Some(feed) = self.feed.as_mut() {
            let events = feed.drain();
            self.apply_events(events, input);
        }
        for id in self.pointed_out.expire(input.now) {
            if let Some(state) = self.store.get_mut(&id) {
                state.text_dirty = true;
            }
        }

        let index: HashMap<&AircraftId, &AircraftSnapshot> =
            input.aircraft.iter().map(|ac| (&ac.id, ac)).collect();
        let ghosts = self.ghost_snapshots(input, &index);

        let tracked: Vec<&AircraftSnapshot> = input
            .aircraft
            .iter()
            .filter(|ac| !ac.id.is_ghost() && self.store.contains(&ac.id))
            .chain(ghosts.iter())
            .collect();
        let mut visible: Vec<&AircraftSnapshot> = tracked
            .iter()
            .copied()
            .filter(|ac| ac.is_visible(self.settings.min_altitude, self.settings.max_altitude))
            .collect();
        visible.sort_by_key(|ac| ac.sort_key());

        self.update_label_text(&tracked, &visible, input);

        let positions: HashMap<&AircraftId, Vec2> = visible
            .iter()
            .map(|ac| (&ac.id, input.projector.window_from_latlong(&ac.position)))
            .collect();
        let placement = self.place_labels(&visible, &positions, input);

        let real: Vec<&AircraftSnapshot> =
            visible.iter().copied().filter(|ac| !ac.id.is_ghost()).collect();
        let conflicts = classify_conflicts(&real, &self.settings.range_limits);
        let alert_fired = self.alert.observe(&conflicts, input.now);
        let mit = self.in_trail_spacing(input, &index, &conflicts);
        self.last_conflicts = conflicts.clone();

        FrameOutput {
            labels: self.label_outputs(&visible, &positions, input),
            tracks: self.track_outputs(&visible, &positions, input),
            conflicts,
            mit,
            alert_fired,
            placement,
        }
    }

    fn ghost_snapshots(
        &self,
        input: &FrameInput<'_>,
        index: &HashMap<&AircraftId, &AircraftSnapshot>,
    ) -> Vec<AircraftSnapshot> {
        let Some(projector) = input.ghosts else {
            return Vec::new();
        };
        self.store
            .ghost_links()
            .filter_map(|(source, ghost_id)| {
                let mut ghost = projector.ghost_of(index.get(source)?)?;
                ghost.id = ghost_id.clone();
                Some(ghost)
            })
            .collect()
    }

    fn update_label_text(
        &mut self,
        tracked: &[&AircraftSnapshot],
        visible: &[&AircraftSnapshot],
        input: &FrameInput<'_>,
    ) {
        let mut squawks: HashMap<Squawk, usize> = HashMap::new();
        for ac in tracked.iter().filter(|ac| !ac.id.is_ghost()) {
            *squawks.entry(ac.squawk).or_default() += 1;
        }

        let format = self.settings.label_format;
        for ac in visible {
            let Some(state) = self.store.get(&ac.id) else {
                continue;
            };
            if !state.text_dirty {
                continue;
            }
            let duplicate = squawks.get(&ac.squawk).copied().unwrap_or(0) > 1;
            let pointed_out = self.pointed_out.get(&ac.id, input.now).map(String::as_str);
            let extra = handoff_line(
                ac.inbound_handoff.as_deref(),
                ac.outbound_handoff.as_deref(),
                pointed_out,
            );

            let lines = [0, 1].map(|cycle| {
                let mut text = format.format(ac, duplicate, cycle);
                if let Some(extra) = &extra {
                    text.push('\n');
                    text.push_str(extra);
                }
                text
            });
            let bounds = label_box(input.measurer, &lines);

            if let Some(state) = self.store.get_mut(&ac.id) {
                state.label_lines = lines;
                state.label_box = bounds;
                state.text_dirty = false;
            }
        }
    }

    fn place_labels(
        &mut self,
        visible: &[&AircraftSnapshot],
        positions: &HashMap<&AircraftId, Vec2>,
        input: &FrameInput<'_>,
    ) -> PlacementReport {
        let automatic = self.settings.automatic_layout;
        let layout_area = Extent2D::from_size(input.viewport.x, input.viewport.y).expand(LAYOUT_CULL_MARGIN);
        let candidates: Vec<LabelCandidate> = visible
            .iter()
            .filter_map(|ac| {
                let track = *positions.get(&ac.id)?;
                if automatic && !layout_area.contains(track) {
                    return None;
                }
                Some(LabelCandidate {
                    id: ac.id.clone(),
                    sort_key: ac.sort_key(),
                    track,
                    heading: ac.heading,
                })
            })
            .collect();
        LabelPlacer::new(automatic, input.rotation).place(&candidates, &mut self.store)
    }

    fn in_trail_spacing(
        &mut self,
        input: &FrameInput<'_>,
        index: &HashMap<&AircraftId, &AircraftSnapshot>,
        conflicts: &ConflictReport,
    ) -> Vec<MitSpacing> {
        if !input.mit_sequence.is_empty() {
            // An unknown entry splits the sequence; its neighbours are not
            // in trail of each other.
            let mut spacings = Vec::new();
            let mut run: Vec<&AircraftSnapshot> = Vec::with_capacity(input.mit_sequence.len());
            for id in input.mit_sequence {
                if let Some(ac) = index.get(id) {
                    run.push(*ac);
                } else {
                    self.record(Diagnostic::UnknownSequenceAircraft(id.clone()));
                    spacings.extend(explicit_spacing(&run, conflicts));
                    run.clear();
                }
            }
            spacings.extend(explicit_spacing(&run, conflicts));
            return spacings;
        }
        if !self.settings.auto_mit {
            return Vec::new();
        }

        let mut airports = HashMap::new();
        let mut unknown = Vec::new();
        for name in &self.settings.auto_mit_airports {
            match input.airports.get(name) {
                Some(location) => {
                    airports.insert(name.clone(), *location);
                }
                None => unknown.push(name.clone()),
            }
        }
        for name in unknown {
            self.record(Diagnostic::UnknownAirport(name));
        }

        let arrivals: Vec<&AircraftSnapshot> = input
            .aircraft
            .iter()
            .filter(|ac| {
                !ac.id.is_ghost()
                    && !ac.lost_track
                    && self.store.contains(&ac.id)
                    && ac.destination.as_ref().is_some_and(|d| airports.contains_key(d))
            })
            .collect();
        automatic_spacing(&arrivals, &airports, self.settings.magnetic_variation, conflicts)
    }

    fn label_outputs(
        &self,
        visible: &[&AircraftSnapshot],
        positions: &HashMap<&AircraftId, Vec2>,
        input: &FrameInput<'_>,
    ) -> Vec<LabelOutput> {
        let viewport = Extent2D::from_size(input.viewport.x, input.viewport.y);
        let cycle = flash_index(input.now, self.settings.flash_period_secs);
        let leaders = self.settings.label_format != LabelFormat::None;

        let mut labels: Vec<(bool, &str, LabelOutput)> = visible
            .iter()
            .filter_map(|ac| {
                let state = self.store.get(&ac.id)?;
                let track = *positions.get(&ac.id)?;
                let bounds = state.window_label_bounds(track);
                if !viewport.overlaps(&bounds) {
                    return None;
                }
                let selected = input.selected == Some(&ac.id);
                let leader = if leaders {
                    leader_line_end(&bounds, track).map(|end| (track, end))
                } else {
                    None
                };
                let label = LabelOutput {
                    id: ac.id.clone(),
                    text: state.label_lines[cycle].clone(),
                    bounds,
                    leader,
                    style: LabelStyle::for_aircraft(ac, state.is_ghost, selected, input.own_callsign),
                };
                Some((selected, ac.callsign.as_str(), label))
            })
            .collect();
        // `visible` is already in sort-key order, so a stable sort keeps ties
        // deterministic.
        labels.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        labels.into_iter().map(|(_, _, label)| label).collect()
    }

    fn track_outputs(
        &self,
        visible: &[&AircraftSnapshot],
        positions: &HashMap<&AircraftId, Vec2>,
        input: &FrameInput<'_>,
    ) -> Vec<TrackOutput> {
        visible
            .iter()
            .filter_map(|ac| {
                let position = *positions.get(&ac.id)?;
                let history = history_trail(ac, self.settings.radar_tracks_drawn)
                    .into_iter()
                    .map(|(p, fade)| (input.projector.window_from_latlong(&p), fade))
                    .collect();
                let vector_line = self
                    .settings
                    .vector_lines
                    .and_then(|(mode, extent)| window_vector_line(input.projector, ac, mode, extent));
                Some(TrackOutput {
                    id: ac.id.clone(),
                    position,
                    symbol: TrackSymbol::for_aircraft(ac),
                    is_ghost: ac.id.is_ghost(),
                    history,
                    vector_line,
                })
            })
            .collect()
    }
}
