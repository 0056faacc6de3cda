use serde::Serialize;

use crate::dynamics::phase::PhaseKind;
use crate::dynamics::state::PhaseState;

// ---------------------------------------------------------------------------
// Samples and segments
// ---------------------------------------------------------------------------

/// One reported point of the flight. Internal units are SI; the `*_km` and
/// `*_km_h` accessors are for display and export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectorySample {
    pub phase: PhaseKind,
    pub time: f64,       // s, since lift-off
    pub phase_time: f64, // s, since ignition of `phase`
    pub radius: f64,     // m, from planet centre
    pub velocity: f64,   // m/s
    pub mass: f64,       // kg
}

impl TrajectorySample {
    pub fn state(&self) -> PhaseState {
        PhaseState { time: self.phase_time, radius: self.radius, velocity: self.velocity }
    }

    pub fn radius_km(&self) -> f64 {
        self.radius / 1000.0
    }

    pub fn altitude_km(&self, planet_radius: f64) -> f64 {
        (self.radius - planet_radius) / 1000.0
    }

    pub fn velocity_km_h(&self) -> f64 {
        self.velocity * 3.6
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySegment {
    pub kind: PhaseKind,
    pub samples: Vec<TrajectorySample>,
}

impl TrajectorySegment {
    pub fn first(&self) -> Option<&TrajectorySample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&TrajectorySample> {
        self.samples.last()
    }

    pub fn start_time(&self) -> f64 {
        self.first().map_or(0.0, |s| s.time)
    }

    pub fn end_time(&self) -> f64 {
        self.last().map_or(0.0, |s| s.time)
    }
}

// ---------------------------------------------------------------------------
// Trajectory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// All three phases ran to their full duration.
    Completed,
    /// The vehicle fell back through the planet surface; later phases were not flown.
    SimulatedImpact { phase: PhaseKind, time: f64, velocity: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub vehicle: String,
    pub planet_radius: f64, // m
    pub segments: Vec<TrajectorySegment>,
    pub termination: Termination,
}

impl Trajectory {
    pub fn segment(&self, kind: PhaseKind) -> Option<&TrajectorySegment> {
        self.segments.iter().find(|s| s.kind == kind)
    }

    /// All samples in time order. The sample shared by adjacent segments
    /// (the hand-off point) is yielded once.
    pub fn samples(&self) -> impl Iterator<Item = &TrajectorySample> + '_ {
        self.segments
            .iter()
            .enumerate()
            .flat_map(|(i, seg)| seg.samples.iter().skip(usize::from(i > 0)))
    }

    pub fn first_sample(&self) -> Option<&TrajectorySample> {
        self.segments.first().and_then(|s| s.first())
    }

    pub fn final_sample(&self) -> Option<&TrajectorySample> {
        self.segments.last().and_then(|s| s.last())
    }

    pub fn duration(&self) -> f64 {
        match (self.first_sample(), self.final_sample()) {
            (Some(a), Some(b)) => b.time - a.time,
            _ => 0.0,
        }
    }

    pub fn is_impact(&self) -> bool {
        matches!(self.termination, Termination::SimulatedImpact { .. })
    }

    pub fn max_altitude_sample(&self) -> Option<&TrajectorySample> {
        self.samples().max_by(|a, b| a.radius.total_cmp(&b.radius))
    }

    /// Highest altitude above the surface, km.
    pub fn max_altitude(&self) -> f64 {
        self.max_altitude_sample().map_or(0.0, |s| s.altitude_km(self.planet_radius))
    }

    pub fn max_velocity(&self) -> f64 {
        self.samples().map(|s| s.velocity).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Altitude, velocity and mass curves, each split by phase, for plotting.
    pub fn curves(&self) -> PhaseCurves {
        let r0 = self.planet_radius;
        let build = |f: &dyn Fn(&TrajectorySample) -> f64| -> Vec<PhaseCurve> {
            self.segments
                .iter()
                .map(|seg| PhaseCurve {
                    phase: seg.kind,
                    points: seg.samples.iter().map(|s| [s.time, f(s)]).collect(),
                })
                .collect()
        };
        PhaseCurves {
            altitude_km: build(&|s: &TrajectorySample| s.altitude_km(r0)),
            velocity_m_s: build(&|s: &TrajectorySample| s.velocity),
            mass_kg: build(&|s: &TrajectorySample| s.mass),
        }
    }
}

// ---------------------------------------------------------------------------
// Plot-ready curves
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseCurve {
    pub phase: PhaseKind,
    pub points: Vec<[f64; 2]>, // [time s, value]
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseCurves {
    pub altitude_km: Vec<PhaseCurve>,
    pub velocity_m_s: Vec<PhaseCurve>,
    pub mass_kg: Vec<PhaseCurve>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(phase: PhaseKind, time: f64, phase_time: f64, radius: f64) -> TrajectorySample {
        TrajectorySample { phase, time, phase_time, radius, velocity: time, mass: 100.0 }
    }

    fn two_segments() -> Trajectory {
        Trajectory {
            vehicle: "test".into(),
            planet_radius: 1000.0,
            segments: vec![
                TrajectorySegment {
                    kind: PhaseKind::Boost1,
                    samples: vec![
                        sample(PhaseKind::Boost1, 0.0, 0.0, 1000.0),
                        sample(PhaseKind::Boost1, 1.0, 1.0, 3000.0),
                    ],
                },
                TrajectorySegment {
                    kind: PhaseKind::Boost2,
                    samples: vec![
                        sample(PhaseKind::Boost2, 1.0, 0.0, 3000.0),
                        sample(PhaseKind::Boost2, 2.0, 1.0, 2000.0),
                    ],
                },
            ],
            termination: Termination::Completed,
        }
    }

    #[test]
    fn samples_skip_shared_boundary() {
        let t = two_segments();
        let times: Vec<f64> = t.samples().map(|s| s.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_eq!(t.duration(), 2.0);
    }

    #[test]
    fn curves_split_by_phase() {
        let c = two_segments().curves();
        assert_eq!(c.altitude_km.len(), 2);
        assert_eq!(c.altitude_km[0].phase, PhaseKind::Boost1);
        assert_eq!(c.altitude_km[0].points[1], [1.0, 2.0]);
        assert_eq!(c.mass_kg[1].points.len(), 2);
    }

    #[test]
    fn apex_and_unit_conversions() {
        let t = two_segments();
        let top = t.max_altitude_sample().unwrap();
        assert_eq!(top.radius, 3000.0);
        assert_eq!(top.radius_km(), 3.0);
        assert_eq!(t.max_altitude(), 2.0);
        assert_eq!(top.velocity_km_h(), 3.6);
        assert_eq!(t.max_velocity(), 2.0);
    }
}
