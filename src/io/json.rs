use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::dynamics::phase::PhaseKind;
use crate::error::SimError;
use crate::sim::event::{self, SimEvent};
use crate::sim::{Termination, Trajectory};
use crate::vehicle::VehicleConfig;

#[derive(Debug, Clone, Serialize)]
pub struct PhaseSummary {
    pub phase: PhaseKind,
    pub start_s: f64,
    pub end_s: f64,
    pub end_altitude_km: f64,
    pub end_velocity_m_s: f64,
    pub end_mass_kg: f64,
}

/// Summary statistics computed from a flight trajectory.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    pub vehicle: String,
    pub liftoff_mass_kg: f64,
    pub ideal_delta_v_m_s: f64,
    pub termination: Termination,
    pub flight_time_s: f64,
    pub max_altitude_km: f64,
    pub max_altitude_time_s: f64,
    pub max_velocity_m_s: f64,
    pub phases: Vec<PhaseSummary>,
    pub events: Vec<SimEvent>,
}

impl FlightSummary {
    pub fn from_trajectory(vehicle: &VehicleConfig, trajectory: &Trajectory) -> Self {
        let r0 = trajectory.planet_radius;
        let (max_altitude_km, max_altitude_time_s) = trajectory
            .max_altitude_sample()
            .map_or((0.0, 0.0), |s| (s.altitude_km(r0), s.time));

        let phases = trajectory
            .segments
            .iter()
            .filter_map(|seg| {
                let last = seg.last()?;
                Some(PhaseSummary {
                    phase: seg.kind,
                    start_s: seg.start_time(),
                    end_s: last.time,
                    end_altitude_km: last.altitude_km(r0),
                    end_velocity_m_s: last.velocity,
                    end_mass_kg: last.mass,
                })
            })
            .collect();

        FlightSummary {
            vehicle: vehicle.name.clone(),
            liftoff_mass_kg: vehicle.liftoff_mass(),
            ideal_delta_v_m_s: vehicle.total_delta_v(),
            termination: trajectory.termination,
            flight_time_s: trajectory.duration(),
            max_altitude_km,
            max_altitude_time_s,
            max_velocity_m_s: trajectory.max_velocity(),
            phases,
            events: event::detect(trajectory),
        }
    }
}

/// Write flight summary as pretty JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &FlightSummary) -> Result<(), SimError> {
    serde_json::to_writer_pretty(&mut *writer, summary).map_err(std::io::Error::from)?;
    writeln!(writer)?;
    Ok(())
}

/// Write flight summary to a JSON file.
pub fn write_summary_file<P: AsRef<Path>>(
    path: P,
    summary: &FlightSummary,
) -> Result<(), SimError> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::SimConfig;
    use crate::sim::simulate;
    use crate::vehicle::presets;

    #[test]
    fn summary_json_round_trips_key_fields() {
        let v = presets::falcon9_crew_dragon().unwrap();
        let traj = simulate(&v, &SimConfig::default()).unwrap();
        let summary = FlightSummary::from_trajectory(&v, &traj);

        let mut buf = Vec::new();
        write_summary(&mut buf, &summary).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["vehicle"], "Falcon 9 / Crew Dragon");
        assert_eq!(value["termination"]["kind"], "simulated_impact");
        assert_eq!(value["termination"]["phase"], "coast");
        assert_eq!(value["phases"].as_array().unwrap().len(), 3);
        assert!(value["max_altitude_km"].as_f64().unwrap() > 1_000.0);
        let events = value["events"].as_array().unwrap();
        assert_eq!(events.first().unwrap()["kind"]["event"], "liftoff");
        assert_eq!(events.last().unwrap()["kind"]["event"], "impact");
    }
}
