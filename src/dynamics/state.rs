use nalgebra::Vector2;

use crate::error::SimError;
use crate::physics::Planet;
use crate::sim::integrator::Tolerances;

/// Sample count numpy's `linspace` picks by default.
pub const DEFAULT_SAMPLES: usize = 50;
/// Finer per-phase sampling used for plotting.
pub const DENSE_SAMPLES: usize = 101;
/// Coast after second-stage cutoff, s.
pub const DEFAULT_COAST_DURATION: f64 = 1_250.0;

// ---------------------------------------------------------------------------
// Radial state: distance from planet centre and radial velocity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseState {
    pub time: f64,     // s, elapsed since phase ignition
    pub radius: f64,   // m, from planet centre
    pub velocity: f64, // m/s, radial
}

impl PhaseState {
    /// Launch pad: on the surface, at rest.
    pub fn launch(planet: &Planet) -> Self {
        Self { time: 0.0, radius: planet.radius, velocity: 0.0 }
    }

    pub fn from_vector(time: f64, y: &Vector2<f64>) -> Self {
        Self { time, radius: y[0], velocity: y[1] }
    }

    /// Integrator state vector `[radius, velocity]`.
    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.radius, self.velocity)
    }

    pub fn altitude(&self, planet: &Planet) -> f64 {
        self.radius - planet.radius
    }

    /// Same state re-based to t = 0, the initial condition of the next phase.
    pub fn hand_off(&self) -> Self {
        Self { time: 0.0, ..*self }
    }
}

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub planet: Planet,
    pub coast_duration: f64,     // s
    pub samples_per_phase: usize,
    pub tolerances: Tolerances,
    pub detect_impact: bool,
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        self.planet.validate()?;
        if !(self.coast_duration.is_finite() && self.coast_duration > 0.0) {
            return Err(SimError::invalid(format!(
                "coast duration must be > 0, got {}",
                self.coast_duration
            )));
        }
        if self.samples_per_phase < 2 {
            return Err(SimError::invalid(format!(
                "need at least 2 samples per phase, got {}",
                self.samples_per_phase
            )));
        }
        self.tolerances.validate()
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            planet: Planet::earth(),
            coast_duration: DEFAULT_COAST_DURATION,
            samples_per_phase: DEFAULT_SAMPLES,
            tolerances: Tolerances::default(),
            detect_impact: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_state_sits_on_surface() {
        let earth = Planet::earth();
        let s = PhaseState::launch(&earth);
        assert_eq!(s.radius, earth.radius);
        assert_eq!(s.velocity, 0.0);
        assert_eq!(s.altitude(&earth), 0.0);
        assert_eq!(PhaseState::from_vector(0.0, &s.to_vector()), s);
    }

    #[test]
    fn hand_off_resets_phase_clock_only() {
        let s = PhaseState { time: 162.0, radius: 6.5e6, velocity: 1800.0 };
        let next = s.hand_off();
        assert_eq!(next.time, 0.0);
        assert_eq!(next.radius, s.radius);
        assert_eq!(next.velocity, s.velocity);
    }

    #[test]
    fn config_validation() {
        assert!(SimConfig::default().validate().is_ok());
        let cfg = SimConfig { samples_per_phase: 1, ..SimConfig::default() };
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfiguration(_))));
        let cfg = SimConfig { coast_duration: 0.0, ..SimConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
