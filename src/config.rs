//! TOML mission files: one vehicle plus optional planet and simulation settings.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::dynamics::state::{SimConfig, DEFAULT_COAST_DURATION, DEFAULT_SAMPLES};
use crate::error::SimError;
use crate::physics::Planet;
use crate::sim::integrator::Tolerances;
use crate::vehicle::{Stage, StageBuilder, VehicleConfig};

/// Errors that can occur while reading a mission file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read mission file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize, Clone)]
pub struct MissionFile {
    pub name: String,
    #[serde(default)]
    pub payload_mass: f64,
    #[serde(default)]
    pub planet: Option<Planet>,
    #[serde(default)]
    pub simulation: SimulationSection,
    pub stage1: StageSection,
    pub stage2: StageSection,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationSection {
    pub coast_duration: f64,
    pub samples_per_phase: usize,
    pub rtol: f64,
    pub atol: f64,
    pub detect_impact: bool,
}

impl Default for SimulationSection {
    fn default() -> Self {
        let tol = Tolerances::default();
        Self {
            coast_duration: DEFAULT_COAST_DURATION,
            samples_per_phase: DEFAULT_SAMPLES,
            rtol: tol.rtol,
            atol: tol.atol,
            detect_impact: true,
        }
    }
}

/// Stage parameters as written in a mission file. Give `isp` or
/// `exhaust_velocity`, and optionally `thrust` or `mass_flow`.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StageSection {
    #[serde(default)]
    pub name: Option<String>,
    pub dry_mass: f64,
    pub propellant_mass: f64,
    pub burn_time: f64,
    #[serde(default)]
    pub isp: Option<f64>,
    #[serde(default)]
    pub exhaust_velocity: Option<f64>,
    #[serde(default)]
    pub thrust: Option<f64>,
    #[serde(default)]
    pub mass_flow: Option<f64>,
}

impl StageSection {
    fn build(&self, default_name: &str, planet: &Planet) -> Result<Stage, SimError> {
        let name = self.name.clone().unwrap_or_else(|| default_name.to_string());
        let mut builder = StageBuilder::new(name)
            .dry_mass(self.dry_mass)
            .propellant_mass(self.propellant_mass)
            .burn_time(self.burn_time);

        if let Some(isp) = self.isp {
            builder = builder.isp(isp);
        }
        if let Some(ve) = self.exhaust_velocity {
            builder = builder.exhaust_velocity(ve);
        }
        if let Some(thrust) = self.thrust {
            builder = builder.thrust(thrust);
        }
        if let Some(m_dot) = self.mass_flow {
            builder = builder.mass_flow(m_dot);
        }
        builder.build(planet)
    }
}

impl MissionFile {
    /// Validate and split into the vehicle and simulation configuration.
    pub fn into_configs(self) -> Result<(VehicleConfig, SimConfig), SimError> {
        let planet = self.planet.unwrap_or_default();
        planet.validate()?;
        let stage1 = self.stage1.build("stage1", &planet)?;
        let stage2 = self.stage2.build("stage2", &planet)?;
        let vehicle = VehicleConfig::new(self.name, stage1, stage2, self.payload_mass)?;

        let sim = &self.simulation;
        let config = SimConfig {
            planet,
            coast_duration: sim.coast_duration,
            samples_per_phase: sim.samples_per_phase,
            tolerances: Tolerances::new(sim.rtol, sim.atol),
            detect_impact: sim.detect_impact,
        };
        config.validate()?;
        Ok((vehicle, config))
    }
}

pub fn parse_mission(contents: &str) -> Result<MissionFile, ConfigError> {
    Ok(toml::from_str(contents)?)
}

pub fn load_mission<P: AsRef<Path>>(path: P) -> Result<MissionFile, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_mission(&contents)
}
