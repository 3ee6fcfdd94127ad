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

//! Label (datablock) layout.
//!
//! In automatic mode every frame runs four phases over the visible aircraft,
//! sorted so the result does not depend on snapshot order:
//!
//! 1. labels with a manual offset are pinned where the user put them;
//! 2. labels whose heading-preferred position overlaps nothing already placed
//!    are placed there;
//! 3. the rest are pushed apart by a bounded force-directed relaxation,
//!    starting from last frame's offset;
//! 4. relaxed labels are walked back towards their preferred position one
//!    unit at a time for as long as that does not create an overlap.
//!
//! Overlap-free output is best effort. Residual overlap after the bounded
//! relaxation is accepted and reported through [`PlacementReport`].

use log::debug;

use crate::aircraft::AircraftId;
use crate::geometry::{Extent2D, Vec2};
use crate::label::anchor::ideal_offset;
use crate::state::{ScopeStore, LABEL_PADDING};

pub const RELAXATION_ITERATIONS: usize = 20;
/// Step length per unit of accumulated repulsion.
pub const RELAXATION_GAIN: f32 = 2.0;
pub const MAX_RELAXATION_STEP: f32 = 32.0;

/// One aircraft whose label should be laid out this frame.
#[derive(Debug, Clone)]
pub struct LabelCandidate {
    pub id: AircraftId,
    /// Deterministic ordering key, see `AircraftSnapshot::sort_key`.
    pub sort_key: (String, String),
    /// Track position in window coordinates.
    pub track: Vec2,
    /// Aircraft heading in degrees.
    pub heading: f64,
}

/// Summary of one placement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementReport {
    /// Labels held at a manual offset.
    pub pinned: usize,
    /// Labels placed at their preferred position without adjustment.
    pub ideal: usize,
    /// Labels that went through relaxation.
    pub relaxed: usize,
    /// Pairs of padded label boxes still overlapping afterwards.
    pub residual_overlaps: usize,
    /// True when no padded label boxes overlap.
    pub settled: bool,
}

#[derive(Debug)]
struct Slot {
    id: AircraftId,
    track: Vec2,
    label_box: Extent2D,
    manual: Vec2,
    automatic: Vec2,
    ideal: Vec2,
    bounds: Extent2D,
    placed: bool,
}

impl Slot {
    fn bounds_at(&self, offset: Vec2) -> Extent2D {
        self.label_box.offset(self.track + offset).expand(LABEL_PADDING)
    }
}

/// Computes label offsets for a frame.
#[derive(Debug, Clone, Copy)]
pub struct LabelPlacer {
    /// Avoid overlaps between labels; otherwise each label only looks at its
    /// own heading.
    pub automatic: bool,
    /// Display rotation in degrees, added to headings.
    pub rotation: f64,
}

impl LabelPlacer {
    #[must_use]
    pub fn new(automatic: bool, rotation: f64) -> Self {
        Self {
            automatic,
            rotation,
        }
    }

    /// Lay out the labels of `candidates`, updating `automatic_offset` in
    /// `store`. Candidates without scope state are ignored.
    pub fn place(&self, candidates: &[LabelCandidate], store: &mut ScopeStore) -> PlacementReport {
        let mut ordered: Vec<&LabelCandidate> =
            candidates.iter().filter(|c| store.contains(&c.id)).collect();
        ordered.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));

        let mut slots: Vec<Slot> = ordered
            .into_iter()
            .filter_map(|c| {
                let state = store.get(&c.id)?;
                Some(Slot {
                    id: c.id.clone(),
                    track: c.track,
                    label_box: state.label_box,
                    manual: state.manual_offset,
                    automatic: state.automatic_offset,
                    ideal: ideal_offset(&state.label_box, c.heading, self.rotation),
                    bounds: Extent2D::default(),
                    placed: false,
                })
            })
            .collect();

        let mut report = if self.automatic {
            place_automatic(&mut slots)
        } else {
            place_self_only(&mut slots)
        };
        report.residual_overlaps = count_overlaps(&slots);
        report.settled = report.residual_overlaps == 0;

        for slot in &slots {
            if let Some(state) = store.get_mut(&slot.id) {
                state.automatic_offset = slot.automatic;
            }
        }

        if !report.settled {
            debug!(
                "Label layout left {} overlapping pairs after {} relaxation iterations",
                report.residual_overlaps, RELAXATION_ITERATIONS
            );
        }
        report
    }
}

fn place_self_only(slots: &mut [Slot]) -> PlacementReport {
    let mut report = PlacementReport::default();
    for slot in slots.iter_mut() {
        if slot.manual.is_zero() {
            slot.automatic = slot.ideal;
            report.ideal += 1;
        } else {
            slot.automatic = Vec2::ZERO;
            report.pinned += 1;
        }
        let offset = if slot.manual.is_zero() { slot.automatic } else { slot.manual };
        slot.bounds = slot.bounds_at(offset);
        slot.placed = true;
    }
    report
}

fn place_automatic(slots: &mut [Slot]) -> PlacementReport {
    let mut report = PlacementReport::default();

    // Manual offsets are fixed obstacles.
    for slot in slots.iter_mut() {
        if !slot.manual.is_zero() {
            slot.bounds = slot.bounds_at(slot.manual);
            slot.placed = true;
            report.pinned += 1;
        }
    }

    // Preferred position wherever it is free.
    for i in 0..slots.len() {
        if slots[i].placed {
            continue;
        }
        let candidate = slots[i].bounds_at(slots[i].ideal);
        let free = slots
            .iter()
            .all(|other| !other.placed || !candidate.overlaps(&other.bounds));
        if free {
            let slot = &mut slots[i];
            slot.automatic = slot.ideal;
            slot.bounds = candidate;
            slot.placed = true;
            report.ideal += 1;
        }
    }

    // Remaining labels start from last frame's offset, or the preferred one
    // if they have never been laid out.
    for slot in slots.iter_mut().filter(|s| !s.placed) {
        if slot.automatic.is_zero() {
            slot.automatic = slot.ideal;
        }
        slot.bounds = slot.bounds_at(slot.automatic);
        report.relaxed += 1;
    }
    if report.relaxed == 0 {
        return report;
    }

    relax(slots);
    attract(slots);
    report
}

/// Push unplaced labels away from every label they overlap.
fn relax(slots: &mut [Slot]) {
    for _ in 0..RELAXATION_ITERATIONS {
        let mut any_overlap = false;
        for i in 0..slots.len() {
            if slots[i].placed {
                continue;
            }
            let bounds = slots[i].bounds;
            let mut force = Vec2::ZERO;
            for (j, other) in slots.iter().enumerate() {
                if i == j || !bounds.overlaps(&other.bounds) {
                    continue;
                }
                any_overlap = true;
                let away = bounds.center() - other.bounds.center();
                force += if away.length() > f32::EPSILON {
                    away.normalize()
                } else if i % 2 == 0 {
                    // Coincident centers: alternate labels go up and down.
                    Vec2::new(0.0, 1.0)
                } else {
                    Vec2::new(0.0, -1.0)
                };
            }
            let step = (force * RELAXATION_GAIN).clamp_length(MAX_RELAXATION_STEP);
            let slot = &mut slots[i];
            slot.automatic += step;
            slot.bounds = bounds.offset(step);
        }
        if !any_overlap {
            break;
        }
    }
}

/// Walk unplaced labels back towards their preferred offset in unit steps
/// until a full pass makes no progress.
fn attract(slots: &mut [Slot]) {
    loop {
        let mut moved = false;
        for i in 0..slots.len() {
            if slots[i].placed {
                continue;
            }
            let remaining = slots[i].ideal - slots[i].automatic;
            if remaining.length() < 1.0 {
                continue;
            }
            let step = remaining.normalize();
            let candidate = slots[i].bounds.offset(step);
            let free = slots
                .iter()
                .enumerate()
                .all(|(j, other)| i == j || !candidate.overlaps(&other.bounds));
            if free {
                let slot = &mut slots[i];
                slot.automatic += step;
                slot.bounds = candidate;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
}

fn count_overlaps(slots: &[Slot]) -> usize {
    let mut count = 0;
    for (i, a) in slots.iter().enumerate() {
        for b in &slots[i + 1..] {
            if a.bounds.overlaps(&b.bounds) {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ScopeState;

    fn label_box() -> Extent2D {
        Extent2D::new(Vec2::new(0.0, -20.0), Vec2::new(40.0, 0.0))
    }

    fn add(store: &mut ScopeStore, name: &str) -> AircraftId {
        let id = AircraftId::new(name);
        store.insert(id.clone());
        let state = store.get_mut(&id).unwrap();
        state.label_box = label_box();
        state.text_dirty = false;
        id
    }

    fn candidate(id: &AircraftId, callsign: &str, x: f32, y: f32, heading: f64) -> LabelCandidate {
        LabelCandidate {
            id: id.clone(),
            sort_key: (callsign.to_string(), id.to_string()),
            track: Vec2::new(x, y),
            heading,
        }
    }

    fn padded(store: &ScopeStore, c: &LabelCandidate) -> Extent2D {
        store.get(&c.id).unwrap().padded_label_bounds(c.track)
    }

    /// Two labels whose preferred positions collide, plus a sparse grid of
    /// unrelated traffic.
    fn crowded_scene(store: &mut ScopeStore) -> Vec<LabelCandidate> {
        let a = add(store, "A");
        let b = add(store, "B");
        let mut candidates = vec![
            candidate(&b, "BAW2", 140.0, 120.0, 135.0),
            candidate(&a, "AAL1", 100.0, 100.0, 135.0),
        ];
        for row in 0..3u8 {
            for col in 0..3u8 {
                let name = format!("G{row}{col}");
                let id = add(store, &name);
                candidates.push(candidate(
                    &id,
                    &name,
                    400.0 + f32::from(col) * 300.0,
                    400.0 + f32::from(row) * 300.0,
                    f64::from(col) * 97.0,
                ));
            }
        }
        candidates
    }

    #[test]
    fn test_empty_and_single_are_trivially_settled() {
        let mut store = ScopeStore::new();
        let placer = LabelPlacer::new(true, 0.0);
        let report = placer.place(&[], &mut store);
        assert!(report.settled);

        let a = add(&mut store, "A");
        let report = placer.place(&[candidate(&a, "AAL1", 50.0, 50.0, 0.0)], &mut store);
        assert_eq!(report.ideal, 1);
        assert!(report.settled);
        assert_eq!(
            store.get(&a).unwrap().automatic_offset,
            ideal_offset(&label_box(), 0.0, 0.0)
        );
    }

    #[test]
    fn test_conflicting_labels_are_separated() {
        let mut store = ScopeStore::new();
        let candidates = crowded_scene(&mut store);
        let report = LabelPlacer::new(true, 0.0).place(&candidates, &mut store);

        assert_eq!(report.relaxed, 1);
        assert!(report.settled);
        for (i, a) in candidates.iter().enumerate() {
            for b in &candidates[i + 1..] {
                assert!(
                    !padded(&store, a).overlaps(&padded(&store, b)),
                    "{} overlaps {}",
                    a.id,
                    b.id
                );
            }
        }

        // AAL1 sorts first and keeps its preferred spot; BAW2 was displaced
        // away from it.
        let ideal = ideal_offset(&label_box(), 135.0, 0.0);
        let a = store.get(&AircraftId::new("A")).unwrap().automatic_offset;
        let b = store.get(&AircraftId::new("B")).unwrap().automatic_offset;
        assert_eq!(a, ideal);
        assert!(b.x > ideal.x && b.y > ideal.y);
    }

    #[test]
    fn test_placement_is_idempotent() {
        let mut store = ScopeStore::new();
        let candidates = crowded_scene(&mut store);
        let placer = LabelPlacer::new(true, 0.0);
        placer.place(&candidates, &mut store);
        let first: Vec<Vec2> = candidates
            .iter()
            .map(|c| store.get(&c.id).unwrap().automatic_offset)
            .collect();

        placer.place(&candidates, &mut store);
        let second: Vec<Vec2> = candidates
            .iter()
            .map(|c| store.get(&c.id).unwrap().automatic_offset)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut forward = ScopeStore::new();
        let candidates = crowded_scene(&mut forward);
        LabelPlacer::new(true, 0.0).place(&candidates, &mut forward);

        let mut backward = ScopeStore::new();
        let mut reversed = crowded_scene(&mut backward);
        reversed.reverse();
        LabelPlacer::new(true, 0.0).place(&reversed, &mut backward);

        for c in &candidates {
            assert_eq!(
                forward.get(&c.id).unwrap().automatic_offset,
                backward.get(&c.id).unwrap().automatic_offset
            );
        }
    }

    #[test]
    fn test_manual_offset_is_never_displaced() {
        let mut store = ScopeStore::new();
        let pinned = add(&mut store, "P");
        store.get_mut(&pinned).unwrap().manual_offset = Vec2::new(10.0, 10.0);
        let other = add(&mut store, "O");

        // The other aircraft sits right where the pinned label is.
        let candidates = vec![
            candidate(&pinned, "ZZZ9", 100.0, 100.0, 0.0),
            candidate(&other, "AAA1", 112.0, 95.0, 0.0),
        ];
        let report = LabelPlacer::new(true, 0.0).place(&candidates, &mut store);
        assert_eq!(report.pinned, 1);

        let bounds = store.get(&pinned).unwrap().window_label_bounds(Vec2::new(100.0, 100.0));
        assert_eq!(bounds, label_box().offset(Vec2::new(110.0, 110.0)));

        // Self-only layout keeps it too, and clears the automatic offset.
        LabelPlacer::new(false, 0.0).place(&candidates, &mut store);
        let state = store.get(&pinned).unwrap();
        assert_eq!(state.automatic_offset, Vec2::ZERO);
        assert_eq!(
            state.window_label_bounds(Vec2::new(100.0, 100.0)),
            label_box().offset(Vec2::new(110.0, 110.0))
        );
    }

    #[test]
    fn test_self_only_ignores_neighbours() {
        let mut store = ScopeStore::new();
        let candidates = crowded_scene(&mut store);
        let report = LabelPlacer::new(false, 0.0).place(&candidates, &mut store);
        assert_eq!(report.relaxed, 0);
        assert!(!report.settled);

        let ideal = ideal_offset(&label_box(), 135.0, 0.0);
        assert_eq!(store.get(&AircraftId::new("B")).unwrap().automatic_offset, ideal);
    }

    #[test]
    fn test_coincident_labels_are_pulled_apart() {
        let mut store = ScopeStore::new();
        let a = add(&mut store, "A");
        let b = add(&mut store, "B");
        let c = add(&mut store, "C");
        // Same track, same text, same heading: identical preferred boxes.
        let candidates = vec![
            candidate(&a, "AAL1", 300.0, 300.0, 0.0),
            candidate(&b, "BAW2", 300.0, 300.0, 0.0),
            candidate(&c, "CPA3", 300.0, 300.0, 0.0),
        ];

        let report = LabelPlacer::new(true, 0.0).place(&candidates, &mut store);
        assert_eq!(report.ideal, 1);
        assert_eq!(report.relaxed, 2);
        assert!(report.settled);
        let below = store.get(&b).unwrap().automatic_offset;
        let above = store.get(&c).unwrap().automatic_offset;
        assert!(below.y < store.get(&a).unwrap().automatic_offset.y);
        assert!(above.y > store.get(&a).unwrap().automatic_offset.y);
        for (i, x) in candidates.iter().enumerate() {
            for y in &candidates[i + 1..] {
                assert!(!padded(&store, x).overlaps(&padded(&store, y)));
            }
        }

        let again = LabelPlacer::new(true, 0.0).place(&candidates, &mut store);
        assert_eq!(again, report);
    }

    #[test]
    fn test_unknown_candidates_are_skipped() {
        let mut store = ScopeStore::new();
        let ghost = AircraftId::new("X");
        let report =
            LabelPlacer::new(true, 0.0).place(&[candidate(&ghost, "X", 0.0, 0.0, 0.0)], &mut store);
        assert_eq!(report, PlacementReport { settled: true, ..Default::default() });
        assert!(store.get(&ghost).is_none());
        assert_eq!(store.get(&AircraftId::new("Y")), None::<&ScopeState>);
    }
}
