use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::dynamics::phase::PhaseKind;
use crate::error::SimError;
use crate::sim::Trajectory;

/// One CSV row. Kilometre and km/h columns are derived here, at the boundary.
#[derive(Debug, Serialize)]
struct Row {
    phase: PhaseKind,
    time_s: f64,
    phase_time_s: f64,
    altitude_km: f64,
    radius_km: f64,
    velocity_m_s: f64,
    velocity_km_h: f64,
    mass_kg: f64,
}

/// Write every trajectory sample as CSV.
///
/// Columns: phase, time_s, phase_time_s, altitude_km, radius_km,
///          velocity_m_s, velocity_km_h, mass_kg
pub fn write_trajectory<W: Write>(writer: W, trajectory: &Trajectory) -> Result<(), SimError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for s in trajectory.samples() {
        wtr.serialize(Row {
            phase: s.phase,
            time_s: s.time,
            phase_time_s: s.phase_time,
            altitude_km: s.altitude_km(trajectory.planet_radius),
            radius_km: s.radius_km(),
            velocity_m_s: s.velocity,
            velocity_km_h: s.velocity_km_h(),
            mass_kg: s.mass,
        })
        .map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write trajectory to a CSV file at the given path.
pub fn write_trajectory_file<P: AsRef<Path>>(
    path: P,
    trajectory: &Trajectory,
) -> Result<(), SimError> {
    let file = std::fs::File::create(path)?;
    write_trajectory(file, trajectory)
}

fn csv_error(err: csv::Error) -> SimError {
    match err.into_kind() {
        csv::ErrorKind::Io(e) => SimError::Io(e),
        other => SimError::Io(std::io::Error::other(format!("csv: {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::SimConfig;
    use crate::sim::simulate;
    use crate::vehicle::presets;

    #[test]
    fn csv_output_has_header_and_rows() {
        let v = presets::falcon9_full_thrust().unwrap();
        let traj = simulate(&v, &SimConfig::default()).unwrap();

        let mut buf = Vec::new();
        write_trajectory(&mut buf, &traj).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(
            lines[0],
            "phase,time_s,phase_time_s,altitude_km,radius_km,velocity_m_s,velocity_km_h,mass_kg"
        );
        // header + 3 phases of 50 with the two hand-off samples shared
        assert_eq!(lines.len(), 1 + 3 * 50 - 2);
        assert!(lines[1].starts_with("boost1,0.0,0.0,0.0,"));
        assert!(lines.last().unwrap().starts_with("coast,"));
    }
}
