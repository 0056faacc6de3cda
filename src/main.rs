use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ascent_sim::config;
use ascent_sim::io::csv;
use ascent_sim::io::json::{self, FlightSummary};
use ascent_sim::prelude::*;
use ascent_sim::sim::event::{self, EventKind};

#[derive(Parser)]
#[command(author, version, about = "Two-stage radial ascent simulator (boost, boost, coast)")]
struct Cli {
    /// Built-in vehicle
    #[arg(long, value_enum, default_value_t = Preset::Falcon9FullThrust, conflicts_with = "config")]
    preset: Preset,

    /// TOML mission file instead of a preset
    #[arg(long)]
    config: Option<PathBuf>,

    /// Samples per phase (50 and 101 are the usual choices)
    #[arg(long)]
    samples: Option<usize>,

    /// Coast duration after second-stage cutoff, s
    #[arg(long)]
    coast: Option<f64>,

    /// Let the coast run through the surface instead of stopping at impact
    #[arg(long, default_value_t = false)]
    no_impact: bool,

    /// Write the trajectory as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write a JSON flight summary
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum Preset {
    Falcon9FullThrust,
    Falcon9CrewDragon,
    Falcon9Legacy,
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Cli::parse()) {
        error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), SimError> {
    let (vehicle, mut sim) = match &cli.config {
        Some(path) => config::load_mission(path)?.into_configs()?,
        None => {
            let vehicle = match cli.preset {
                Preset::Falcon9FullThrust => presets::falcon9_full_thrust()?,
                Preset::Falcon9CrewDragon => presets::falcon9_crew_dragon()?,
                Preset::Falcon9Legacy => presets::falcon9_legacy()?,
            };
            (vehicle, SimConfig::default())
        }
    };
    if let Some(n) = cli.samples {
        sim.samples_per_phase = n;
    }
    if let Some(coast) = cli.coast {
        sim.coast_duration = coast;
    }
    if cli.no_impact {
        sim.detect_impact = false;
    }

    let trajectory = simulate(&vehicle, &sim)?;
    print_report(&vehicle, &sim, &trajectory);

    if let Some(path) = &cli.csv {
        csv::write_trajectory_file(path, &trajectory)?;
        println!("  Exported trajectory: {}", path.display());
    }
    if let Some(path) = &cli.json {
        let summary = FlightSummary::from_trajectory(&vehicle, &trajectory);
        json::write_summary_file(path, &summary)?;
        println!("  Exported summary:    {}", path.display());
    }
    Ok(())
}

fn print_report(vehicle: &VehicleConfig, sim: &SimConfig, trajectory: &Trajectory) {
    let r0 = sim.planet.radius;
    let rule = "  ──────────────────────────────────────────────────────────────────";

    println!();
    println!("====================================================================");
    println!("  ASCENT SIMULATION: {}", vehicle.name);
    println!("====================================================================");
    println!();
    println!("  Vehicle Parameters");
    println!("{rule}");
    for stage in [&vehicle.stage1, &vehicle.stage2] {
        println!(
            "  {:<12} dry {:>9.0} kg   prop {:>9.0} kg   ve {:>7.1} m/s",
            stage.name, stage.dry_mass, stage.propellant_mass, stage.exhaust_velocity
        );
        println!(
            "  {:<12} flow {:>8.2} kg/s thrust {:>8.0} kN   burn {:>6.1} s",
            "", stage.mass_flow, stage.thrust() / 1000.0, stage.burn_time
        );
    }
    println!(
        "  Payload:      {:>9.0} kg   Lift-off: {:>9.0} kg   Ideal dv: {:>6.0} m/s",
        vehicle.payload_mass,
        vehicle.liftoff_mass(),
        vehicle.total_delta_v()
    );
    println!();

    println!("  Flight Events");
    println!("{rule}");
    for ev in event::detect(trajectory) {
        let label = match &ev.kind {
            EventKind::Liftoff => "LIFTOFF".to_string(),
            EventKind::Burnout { phase } => format!("BURNOUT {}", phase.label().to_uppercase()),
            EventKind::Apogee => "APOGEE".to_string(),
            EventKind::Impact => "IMPACT".to_string(),
        };
        println!(
            "  {:<18} t={:>7.1}s   alt={:>9.1}km   vel={:>8.1}m/s",
            label,
            ev.time,
            ev.sample.altitude_km(r0),
            ev.sample.velocity
        );
    }
    println!();

    println!("  Trajectory");
    println!("{rule}");
    println!(
        "  {:>7}  {:>10}  {:>9}  {:>10}  {:>10}  {:>7}",
        "t (s)", "alt (km)", "vel (m/s)", "vel (km/h)", "mass (kg)", "phase"
    );
    println!("  {}", "─".repeat(62));

    let samples: Vec<_> = trajectory.samples().collect();
    let interval = (samples.len() / 30).max(1);
    for (i, s) in samples.iter().enumerate() {
        let boundary = i + 1 < samples.len() && samples[i + 1].phase != s.phase;
        if i % interval != 0 && !boundary && i + 1 != samples.len() {
            continue;
        }
        println!(
            "  {:>7.1}  {:>10.2}  {:>9.1}  {:>10.0}  {:>10.0}  {:>7}",
            s.time,
            s.altitude_km(r0),
            s.velocity,
            s.velocity_km_h(),
            s.mass,
            s.phase
        );
    }

    println!();
    match trajectory.termination {
        Termination::Completed => {
            println!("  Outcome: completed all phases ({:.0} s)", trajectory.duration())
        }
        Termination::SimulatedImpact { phase, time, velocity } => println!(
            "  Outcome: simulated impact during {} at t={:.1} s ({:.1} m/s)",
            phase.label(),
            time,
            velocity
        ),
    }
    println!("  Sampling: {} per phase", sim.samples_per_phase);
    println!("====================================================================");
    println!();
}
