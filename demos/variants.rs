use ascent_sim::prelude::*;

/// Fly every preset and report how each run ends.
fn main() {
    let variants: [(&str, fn() -> Result<VehicleConfig, SimError>); 3] = [
        ("full thrust", presets::falcon9_full_thrust),
        ("crew dragon", presets::falcon9_crew_dragon),
        ("legacy", presets::falcon9_legacy),
    ];

    for (label, build) in variants {
        let outcome = build().and_then(|v| simulate(&v, &SimConfig::default()));
        match outcome {
            Ok(traj) => {
                let apex = traj
                    .max_altitude_sample()
                    .map_or(0.0, |s| s.altitude_km(traj.planet_radius));
                println!("{label:>12}: {:?}, apex {apex:.0} km", traj.termination);
            }
            Err(e) => println!("{label:>12}: rejected ({e})"),
        }
    }
}
