use serde::Serialize;

use crate::dynamics::phase::PhaseKind;

use super::trajectory::{Termination, Trajectory, TrajectorySample};

// ---------------------------------------------------------------------------
// Flight events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    Liftoff,
    Burnout { phase: PhaseKind },
    Apogee,
    Impact,
}

/// A discrete event picked out of a finished trajectory.
#[derive(Debug, Clone, Serialize)]
pub struct SimEvent {
    pub time: f64,
    pub kind: EventKind,
    pub sample: TrajectorySample,
}

/// Passive detectors that look at consecutive samples.
pub trait EventDetector {
    fn check(&mut self, prev: &TrajectorySample, current: &TrajectorySample) -> Option<EventKind>;
}

/// Radial velocity turning from climb to fall.
pub struct ApogeeDetector;

impl EventDetector for ApogeeDetector {
    fn check(&mut self, prev: &TrajectorySample, current: &TrajectorySample) -> Option<EventKind> {
        if prev.velocity > 0.0 && current.velocity <= 0.0 {
            Some(EventKind::Apogee)
        } else {
            None
        }
    }
}

/// Lift-off, each burnout, apogee and impact, in time order.
pub fn detect(trajectory: &Trajectory) -> Vec<SimEvent> {
    let mut events = Vec::new();

    if let Some(first) = trajectory.first_sample() {
        events.push(SimEvent { time: first.time, kind: EventKind::Liftoff, sample: *first });
    }

    let samples: Vec<&TrajectorySample> = trajectory.samples().collect();
    let mut apogee = ApogeeDetector;
    for pair in samples.windows(2) {
        if let Some(kind) = apogee.check(pair[0], pair[1]) {
            events.push(SimEvent { time: pair[1].time, kind, sample: *pair[1] });
        }
    }

    for seg in &trajectory.segments {
        if !seg.kind.is_powered() {
            continue;
        }
        let impacted_here = matches!(
            trajectory.termination,
            Termination::SimulatedImpact { phase, .. } if phase == seg.kind
        );
        if let (Some(last), false) = (seg.last(), impacted_here) {
            events.push(SimEvent {
                time: last.time,
                kind: EventKind::Burnout { phase: seg.kind },
                sample: *last,
            });
        }
    }

    let impact = matches!(trajectory.termination, Termination::SimulatedImpact { .. });
    if let (true, Some(last)) = (impact, trajectory.final_sample()) {
        events.push(SimEvent { time: last.time, kind: EventKind::Impact, sample: *last });
    }

    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    events
}
