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

//! Separation monitoring.
//!
//! [`classify_conflicts`] flags aircraft pairs closer than their range limits;
//! the [`mit`] module measures in-trail spacing between arrivals.

pub mod mit;

use std::ops::{Index, IndexMut};

use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::aircraft::{AircraftId, AircraftSnapshot, FlightRules};
use crate::geo::nm_distance;

/// Minimum time between two conflict alerts.
pub const ALERT_COOLDOWN_SECS: i64 = 3;

/// Separation thresholds for one flight-rule category. Lateral limits are in
/// nautical miles, vertical limits in feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeLimits {
    pub warning_lateral: f64,
    pub warning_vertical: f64,
    pub violation_lateral: f64,
    pub violation_vertical: f64,
}

impl RangeLimits {
    #[must_use]
    pub const fn ifr() -> Self {
        Self {
            warning_lateral: 4.0,
            warning_vertical: 1500.0,
            violation_lateral: 3.0,
            violation_vertical: 1000.0,
        }
    }

    #[must_use]
    pub const fn vfr() -> Self {
        Self {
            warning_lateral: 1.5,
            warning_vertical: 500.0,
            violation_lateral: 0.75,
            violation_vertical: 300.0,
        }
    }

    /// Violation thresholds do not exceed warning thresholds.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.violation_lateral <= self.warning_lateral
            && self.violation_vertical <= self.warning_vertical
    }

    /// Order by how tight the thresholds are, tightest first.
    fn restrictiveness(&self, other: &Self) -> std::cmp::Ordering {
        self.violation_lateral
            .total_cmp(&other.violation_lateral)
            .then(self.violation_vertical.total_cmp(&other.violation_vertical))
            .then(self.warning_lateral.total_cmp(&other.warning_lateral))
            .then(self.warning_vertical.total_cmp(&other.warning_vertical))
    }
}

/// Range limits for every flight-rule category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeLimitsTable(pub [RangeLimits; FlightRules::COUNT]);

impl Default for RangeLimitsTable {
    fn default() -> Self {
        let mut table = [RangeLimits::ifr(); FlightRules::COUNT];
        table[FlightRules::Vfr.index()] = RangeLimits::vfr();
        Self(table)
    }
}

impl Index<FlightRules> for RangeLimitsTable {
    type Output = RangeLimits;

    fn index(&self, rules: FlightRules) -> &RangeLimits {
        &self.0[rules.index()]
    }
}

impl IndexMut<FlightRules> for RangeLimitsTable {
    fn index_mut(&mut self, rules: FlightRules) -> &mut RangeLimits {
        &mut self.0[rules.index()]
    }
}

impl RangeLimitsTable {
    /// Limits applying to a pair of aircraft: the more restrictive of the two
    /// categories' entries, earlier category on a tie.
    #[must_use]
    pub fn for_pair(&self, a: FlightRules, b: FlightRules) -> (FlightRules, RangeLimits) {
        if a == b {
            return (a, self[a]);
        }
        let (first, second) = if a.index() < b.index() { (a, b) } else { (b, a) };
        if self[second].restrictiveness(&self[first]).is_lt() {
            (second, self[second])
        } else {
            (first, self[first])
        }
    }
}

/// Two aircraft, without order: `{a, b} == {b, a}`.
#[derive(Debug, Clone)]
pub struct AircraftPair {
    pub a: AircraftId,
    pub b: AircraftId,
}

impl AircraftPair {
    #[must_use]
    pub fn new(a: AircraftId, b: AircraftId) -> Self {
        Self { a, b }
    }
}

impl PartialEq for AircraftPair {
    fn eq(&self, other: &Self) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

impl Eq for AircraftPair {}

/// Severity of a separation breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictLevel {
    Warning,
    Violation,
}

/// A flagged pair of aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub pair: AircraftPair,
    pub level: ConflictLevel,
    /// Category whose limits were applied.
    pub rules: FlightRules,
    pub limits: RangeLimits,
    pub lateral_nm: f64,
    pub vertical_ft: f64,
}

impl Conflict {
    /// Overlay text: lateral distance and vertical separation in hundreds of
    /// feet, e.g. `2.9 10`.
    #[must_use]
    pub fn annotation(&self) -> String {
        let hundreds = ((self.vertical_ft + 50.0) / 100.0).floor() as i64;
        format!("{:.1} {hundreds}", self.lateral_nm)
    }
}

/// Result of one classification pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictReport {
    pub warnings: Vec<Conflict>,
    pub violations: Vec<Conflict>,
}

impl ConflictReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.violations.is_empty()
    }

    /// Whether `pair` was flagged at either level.
    #[must_use]
    pub fn contains(&self, pair: &AircraftPair) -> bool {
        self.iter().any(|c| c.pair == *pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conflict> {
        self.warnings.iter().chain(self.violations.iter())
    }
}

/// Classify every pair of `aircraft`.
///
/// Callers pass only the aircraft that take part (real, tracked and inside
/// the altitude filter); results follow the order of `aircraft`.
#[must_use]
pub fn classify_conflicts(aircraft: &[&AircraftSnapshot], limits: &RangeLimitsTable) -> ConflictReport {
    let mut report = ConflictReport::default();
    for (i, a) in aircraft.iter().enumerate() {
        for b in &aircraft[i + 1..] {
            let (rules, entry) = limits.for_pair(a.flight_rules, b.flight_rules);
            let lateral = nm_distance(&a.position, &b.position);
            let vertical = f64::from(a.altitude.abs_diff(b.altitude));

            let level = if lateral < entry.violation_lateral && vertical < entry.violation_vertical {
                ConflictLevel::Violation
            } else if lateral < entry.warning_lateral && vertical < entry.warning_vertical {
                ConflictLevel::Warning
            } else {
                continue;
            };

            let conflict = Conflict {
                pair: AircraftPair::new(a.id.clone(), b.id.clone()),
                level,
                rules,
                limits: entry,
                lateral_nm: lateral,
                vertical_ft: vertical,
            };
            match level {
                ConflictLevel::Warning => report.warnings.push(conflict),
                ConflictLevel::Violation => report.violations.push(conflict),
            }
        }
    }
    report
}

/// Rate limiter for the audible conflict alert.
#[derive(Debug, Clone)]
pub struct AlertClock {
    last_fired: Option<DateTime<Utc>>,
    cooldown: Duration,
}

impl Default for AlertClock {
    fn default() -> Self {
        Self::new(Duration::seconds(ALERT_COOLDOWN_SECS))
    }
}

impl AlertClock {
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_fired: None,
            cooldown,
        }
    }

    /// Returns true when an alert should fire for this frame. Fires at most
    /// once per call, and only if there are violations and the cooldown has
    /// elapsed since the last firing.
    pub fn observe(&mut self, report: &ConflictReport, now: DateTime<Utc>) -> bool {
        if report.violations.is_empty() {
            return false;
        }
        let ready = self.last_fired.map_or(true, |last| now - last >= self.cooldown);
        if ready {
            info!(
                "Conflict alert: {} violation(s), first {} / {}",
                report.violations.len(),
                report.violations[0].pair.a,
                report.violations[0].pair.b
            );
            self.last_fired = Some(now);
        }
        ready
    }

    #[must_use]
    pub fn last_fired(&self) -> Option<DateTime<Utc>> {
        self.last_fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLong;
    use chrono::TimeZone;

    fn at(name: &str, north_nm: f64, altitude: i32) -> AircraftSnapshot {
        let mut ac = AircraftSnapshot::new(
            AircraftId::new(name),
            name,
            LatLong::new(40.0 + north_nm / 60.0, -74.0),
        );
        ac.altitude = altitude;
        ac
    }

    fn table(limits: RangeLimits) -> RangeLimitsTable {
        RangeLimitsTable([limits; FlightRules::COUNT])
    }

    #[test]
    fn test_pair_is_unordered() {
        let ab = AircraftPair::new(AircraftId::new("A"), AircraftId::new("B"));
        let ba = AircraftPair::new(AircraftId::new("B"), AircraftId::new("A"));
        assert_eq!(ab, ba);
        assert_ne!(ab, AircraftPair::new(AircraftId::new("A"), AircraftId::new("C")));

        let report = ConflictReport {
            warnings: Vec::new(),
            violations: vec![Conflict {
                pair: ab,
                level: ConflictLevel::Violation,
                rules: FlightRules::Ifr,
                limits: RangeLimits::ifr(),
                lateral_nm: 1.0,
                vertical_ft: 0.0,
            }],
        };
        assert!(report.contains(&ba));
    }

    #[test]
    fn test_violation_boundary() {
        let limits = table(RangeLimits {
            warning_lateral: 5.0,
            warning_vertical: 1000.0,
            violation_lateral: 3.0,
            violation_vertical: 500.0,
        });
        let a = at("A", 0.0, 5000);
        let b = at("B", 2.9, 5000);
        let report = classify_conflicts(&[&a, &b], &limits);
        assert_eq!(report.violations.len(), 1);
        assert!(report.warnings.is_empty());
        assert_eq!(report.violations[0].level, ConflictLevel::Violation);
        assert_eq!(report.violations[0].annotation(), "2.9 0");
    }

    #[test]
    fn test_warning_not_violation() {
        let limits = table(RangeLimits {
            warning_lateral: 5.0,
            warning_vertical: 1000.0,
            violation_lateral: 3.0,
            violation_vertical: 500.0,
        });
        let a = at("A", 0.0, 5000);
        let b = at("B", 4.0, 5000);
        let report = classify_conflicts(&[&a, &b], &limits);
        assert!(report.violations.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.contains(&AircraftPair::new(b.id.clone(), a.id.clone())));
    }

    #[test]
    fn test_vertical_separation_clears_conflict() {
        let limits = RangeLimitsTable::default();
        let a = at("A", 0.0, 5000);
        let b = at("B", 1.0, 6600);
        assert!(classify_conflicts(&[&a, &b], &limits).is_empty());

        let c = at("C", 1.0, 6000);
        let report = classify_conflicts(&[&a, &c], &limits);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].annotation(), "1.0 10");
    }

    #[test]
    fn test_mixed_rules_use_tighter_limits() {
        let limits = RangeLimitsTable::default();
        assert_eq!(
            limits.for_pair(FlightRules::Ifr, FlightRules::Vfr),
            (FlightRules::Vfr, RangeLimits::vfr())
        );
        assert_eq!(
            limits.for_pair(FlightRules::Vfr, FlightRules::Ifr),
            (FlightRules::Vfr, RangeLimits::vfr())
        );

        let mut equal = table(RangeLimits::ifr());
        equal[FlightRules::Vfr] = RangeLimits::ifr();
        assert_eq!(equal.for_pair(FlightRules::Vfr, FlightRules::Ifr).0, FlightRules::Ifr);
    }

    #[test]
    fn test_alert_cooldown() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let a = at("A", 0.0, 5000);
        let b = at("B", 1.0, 5000);
        let report = classify_conflicts(&[&a, &b], &RangeLimitsTable::default());

        let mut clock = AlertClock::default();
        assert!(clock.observe(&report, t0));
        assert!(!clock.observe(&report, t0 + Duration::seconds(1)));

        let mut clock = AlertClock::default();
        assert!(clock.observe(&report, t0));
        assert!(clock.observe(&report, t0 + Duration::seconds(4)));
        assert_eq!(clock.last_fired(), Some(t0 + Duration::seconds(4)));

        assert!(!AlertClock::default().observe(&ConflictReport::default(), t0));
    }
}
