use ascent_sim::io::csv;
use ascent_sim::io::json::{self, FlightSummary};
use ascent_sim::prelude::*;

fn main() -> Result<(), SimError> {
    let vehicle = presets::falcon9_full_thrust()?;
    let config = SimConfig { samples_per_phase: DENSE_SAMPLES, ..SimConfig::default() };

    println!("Simulating {} ...", vehicle.name);
    let trajectory = simulate(&vehicle, &config)?;

    let summary = FlightSummary::from_trajectory(&vehicle, &trajectory);
    println!("Max altitude: {:.1} km", summary.max_altitude_km);
    println!("Max velocity: {:.1} m/s", summary.max_velocity_m_s);
    println!("Flight time: {:.1} s", summary.flight_time_s);

    csv::write_trajectory_file("falcon9_trajectory.csv", &trajectory)?;
    json::write_summary_file("falcon9_summary.json", &summary)?;

    println!("Exported: falcon9_trajectory.csv, falcon9_summary.json");
    Ok(())
}
