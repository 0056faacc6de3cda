use std::fmt;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::physics::Planet;
use crate::sim::integrator::OdeSystem;
use crate::vehicle::VehicleConfig;

use super::state::PhaseState;

/// Relative slack allowed between propellant consumed and propellant loaded.
const PREFLIGHT_SLACK: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Flight phases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Boost1,
    Boost2,
    Coast,
}

impl PhaseKind {
    /// Fixed flight order.
    pub const ALL: [PhaseKind; 3] = [PhaseKind::Boost1, PhaseKind::Boost2, PhaseKind::Coast];

    pub fn next(self) -> Option<PhaseKind> {
        match self {
            PhaseKind::Boost1 => Some(PhaseKind::Boost2),
            PhaseKind::Boost2 => Some(PhaseKind::Coast),
            PhaseKind::Coast => None,
        }
    }

    pub fn is_powered(self) -> bool {
        !matches!(self, PhaseKind::Coast)
    }

    pub fn label(self) -> &'static str {
        match self {
            PhaseKind::Boost1 => "Stage 1",
            PhaseKind::Boost2 => "Stage 2",
            PhaseKind::Coast => "Coast",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhaseKind::Boost1 => "boost1",
            PhaseKind::Boost2 => "boost2",
            PhaseKind::Coast => "coast",
        };
        f.pad(s)
    }
}

// ---------------------------------------------------------------------------
// Mass: closed-form linear depletion
// ---------------------------------------------------------------------------

/// The single mass function of a phase. The thrust term and every reported
/// mass sample both read from here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassModel {
    pub initial: f64, // kg at phase ignition
    pub flow: f64,    // kg/s
}

impl MassModel {
    pub fn at(&self, phase_time: f64) -> f64 {
        self.initial - self.flow * phase_time
    }

    /// Phase time at which the whole mass would be expelled.
    pub fn depletion_time(&self) -> f64 {
        if self.flow > 0.0 {
            self.initial / self.flow
        } else {
            f64::INFINITY
        }
    }
}

// ---------------------------------------------------------------------------
// Phase dynamics
// ---------------------------------------------------------------------------

/// Radial equations of motion for one phase: `d/dt [r, v] = [v, a_thrust - mu/r^2]`.
#[derive(Debug, Clone)]
pub struct PhaseModel {
    kind: PhaseKind,
    mass: MassModel,
    exhaust_velocity: f64,
    propellant: f64,
    mu: f64,
    impact_radius: Option<f64>,
}

impl PhaseModel {
    pub fn new(kind: PhaseKind, vehicle: &VehicleConfig, planet: &Planet) -> Self {
        let (mass, exhaust_velocity, propellant) = match vehicle.stage(kind) {
            Some(stage) => (
                MassModel { initial: vehicle.upper_system_mass(kind), flow: stage.mass_flow },
                stage.exhaust_velocity,
                stage.propellant_mass,
            ),
            None => (MassModel { initial: vehicle.coasting_mass(), flow: 0.0 }, 0.0, 0.0),
        };
        Self {
            kind,
            mass,
            exhaust_velocity,
            propellant,
            mu: planet.mu(),
            impact_radius: None,
        }
    }

    /// Stop integration when the radius falls through `radius` (the planet surface).
    pub fn with_impact_at(mut self, radius: f64) -> Self {
        self.impact_radius = Some(radius);
        self
    }

    pub fn mass(&self) -> &MassModel {
        &self.mass
    }

    /// Refuse a burn window longer than the propellant on board allows.
    /// Runs before any sample of the phase is produced.
    pub fn preflight(&self, duration: f64) -> Result<(), SimError> {
        if !self.kind.is_powered() || self.mass.flow == 0.0 {
            return Ok(());
        }
        let used = self.mass.flow * duration;
        if self.exhausted(used) {
            return Err(SimError::NumericalInstability {
                phase: self.kind,
                time: self.propellant / self.mass.flow,
                reason: format!(
                    "propellant exhausted before cutoff: {:.3} kg needed over {:.1} s, \
                     {:.3} kg loaded",
                    used, duration, self.propellant
                ),
            });
        }
        if self.mass.at(duration) <= 0.0 {
            return Err(SimError::NumericalInstability {
                phase: self.kind,
                time: self.mass.depletion_time(),
                reason: "remaining mass reaches zero inside the burn window".into(),
            });
        }
        Ok(())
    }

    fn exhausted(&self, used: f64) -> bool {
        used > self.propellant * (1.0 + PREFLIGHT_SLACK) + PREFLIGHT_SLACK
    }

    /// Thrust acceleration at `phase_time`, m/s^2. Exactly zero without mass flow.
    pub fn thrust_acceleration(&self, phase_time: f64) -> Result<f64, SimError> {
        if !self.kind.is_powered() || self.mass.flow == 0.0 {
            return Ok(0.0);
        }
        if self.exhausted(self.mass.flow * phase_time) {
            return Err(SimError::NumericalInstability {
                phase: self.kind,
                time: phase_time,
                reason: format!(
                    "propellant exhausted at {:.3} s, thrust is undefined past that point",
                    self.propellant / self.mass.flow
                ),
            });
        }
        let remaining = self.mass.at(phase_time);
        if !(remaining > 0.0) {
            return Err(SimError::NumericalInstability {
                phase: self.kind,
                time: phase_time,
                reason: format!(
                    "remaining mass {remaining:.3} kg leaves thrust acceleration unbounded"
                ),
            });
        }
        Ok(self.mass.flow * self.exhaust_velocity / remaining)
    }

    pub fn gravity(&self, radius: f64) -> f64 {
        self.mu / (radius * radius)
    }

    /// `(dr/dt, dv/dt)` for `state`. Its `time` is elapsed phase time.
    pub fn derivative(&self, state: &PhaseState) -> Result<(f64, f64), SimError> {
        let accel = self.thrust_acceleration(state.time)? - self.gravity(state.radius);
        if !accel.is_finite() {
            return Err(SimError::NumericalInstability {
                phase: self.kind,
                time: state.time,
                reason: format!("non-finite acceleration at radius {:.1} m", state.radius),
            });
        }
        Ok((state.velocity, accel))
    }
}

impl OdeSystem for PhaseModel {
    fn rhs(&self, t: f64, y: &Vector2<f64>) -> Result<Vector2<f64>, SimError> {
        let (dr, dv) = self.derivative(&PhaseState::from_vector(t, y))?;
        Ok(Vector2::new(dr, dv))
    }

    fn event(&self, _t: f64, y: &Vector2<f64>) -> Option<f64> {
        self.impact_radius.map(|surface| y[0] - surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::integrator::Integrator;
    use crate::vehicle::{presets, StageBuilder};
    use approx::assert_relative_eq;

    fn zero_thrust_vehicle(planet: &Planet) -> VehicleConfig {
        let base = presets::falcon9_full_thrust().unwrap();
        let inert = StageBuilder::new("inert")
            .dry_mass(3_900.0)
            .propellant_mass(0.0)
            .isp(348.0)
            .mass_flow(0.0)
            .burn_time(397.0)
            .build(planet)
            .unwrap();
        VehicleConfig::new("inert upper", base.stage1, inert, 0.0).unwrap()
    }

    #[test]
    fn lift_off_acceleration() {
        let earth = Planet::earth();
        let v = presets::falcon9_full_thrust().unwrap();
        let model = PhaseModel::new(PhaseKind::Boost1, &v, &earth);
        let (dr, dv) = model.derivative(&PhaseState::launch(&earth)).unwrap();
        assert_eq!(dr, 0.0);
        let expected = v.stage1.thrust() / v.liftoff_mass() - earth.surface_gravity();
        assert_relative_eq!(dv, expected, max_relative = 1e-12);
        assert!(dv > 0.0, "vehicle must leave the pad");
    }

    #[test]
    fn mass_depletes_linearly() {
        let earth = Planet::earth();
        let v = presets::falcon9_crew_dragon().unwrap();
        let model = PhaseModel::new(PhaseKind::Boost2, &v, &earth);
        let m = model.mass();
        assert_relative_eq!(m.at(0.0), v.stage2.wet_mass() + v.payload_mass);
        assert_relative_eq!(
            m.at(v.stage2.burn_time),
            v.stage2.dry_mass + v.payload_mass,
            max_relative = 1e-9
        );
    }

    #[test]
    fn coast_is_pure_gravity() {
        let earth = Planet::earth();
        let v = presets::falcon9_full_thrust().unwrap();
        let model = PhaseModel::new(PhaseKind::Coast, &v, &earth);
        let state = PhaseState { time: 100.0, radius: earth.radius + 500_000.0, velocity: 3000.0 };
        let (dr, dv) = model.derivative(&state).unwrap();
        assert_eq!(dr, 3000.0);
        assert_eq!(dv, -earth.gravity_at(state.radius));
        assert_eq!(model.mass().flow, 0.0);
    }

    #[test]
    fn zero_thrust_stage_matches_coast() {
        let earth = Planet::earth();
        let v = zero_thrust_vehicle(&earth);
        let boost = PhaseModel::new(PhaseKind::Boost2, &v, &earth);
        let coast = PhaseModel::new(PhaseKind::Coast, &v, &earth);
        let state = PhaseState { time: 10.0, radius: earth.radius + 90_000.0, velocity: 1500.0 };
        let thrust = boost.thrust_acceleration(state.time).unwrap();
        assert_eq!(thrust, 0.0);
        assert!(!thrust.is_nan());
        assert_eq!(boost.derivative(&state).unwrap(), coast.derivative(&state).unwrap());
        assert!(boost.preflight(v.stage2.burn_time).is_ok());
    }

    #[test]
    fn preflight_rejects_overlong_burn() {
        let earth = Planet::earth();
        let v = presets::falcon9_full_thrust().unwrap();
        let model = PhaseModel::new(PhaseKind::Boost1, &v, &earth);
        assert!(model.preflight(v.stage1.burn_time).is_ok());
        let err = model.preflight(v.stage1.burn_time + 1.0).unwrap_err();
        match err {
            SimError::NumericalInstability { phase, time, .. } => {
                assert_eq!(phase, PhaseKind::Boost1);
                assert_relative_eq!(time, v.stage1.burn_time, max_relative = 1e-9);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn derivative_fails_past_total_depletion() {
        let earth = Planet::earth();
        let v = presets::falcon9_full_thrust().unwrap();
        let model = PhaseModel::new(PhaseKind::Boost2, &v, &earth);
        let t = model.mass().depletion_time() + 1.0;
        let state = PhaseState { time: t, radius: earth.radius + 1e5, velocity: 0.0 };
        assert!(matches!(
            model.derivative(&state),
            Err(SimError::NumericalInstability { phase: PhaseKind::Boost2, .. })
        ));
    }

    #[test]
    fn integrating_past_propellant_exhaustion_is_unstable() {
        let earth = Planet::earth();
        let v = presets::falcon9_full_thrust().unwrap();
        let model = PhaseModel::new(PhaseKind::Boost2, &v, &earth);
        let y0 = Vector2::new(earth.radius + 100_000.0, 2_000.0);
        let t_end = model.mass().depletion_time() * 1.5;

        match Integrator::default().integrate(&model, 0.0, y0, t_end, 50) {
            Err(SimError::NumericalInstability { phase, time, .. }) => {
                assert_eq!(phase, PhaseKind::Boost2);
                assert!(time > v.stage2.burn_time * (1.0 - 1e-6));
                assert!(time < t_end);
            }
            other => panic!("expected NumericalInstability, got {other:?}"),
        }
    }

    #[test]
    fn overshoot_below_slack_is_rounding() {
        let earth = Planet::earth();
        let base = presets::falcon9_full_thrust().unwrap();
        let with_flow = |scale: f64| {
            let s2 = StageBuilder::new("S2")
                .dry_mass(3_900.0)
                .propellant_mass(105_189.0)
                .isp(348.0)
                .mass_flow(105_189.0 / 397.0 * scale)
                .burn_time(397.0)
                .build(&earth)
                .unwrap();
            let v = VehicleConfig::new("slack", base.stage1.clone(), s2, 0.0).unwrap();
            PhaseModel::new(PhaseKind::Boost2, &v, &earth)
        };
        assert!(with_flow(1.0 + 1e-10).preflight(397.0).is_ok());
        assert!(matches!(
            with_flow(1.0 + 1e-8).preflight(397.0),
            Err(SimError::NumericalInstability { phase: PhaseKind::Boost2, .. })
        ));
    }

    #[test]
    fn thrust_stops_at_propellant_exhaustion() {
        let earth = Planet::earth();
        let v = presets::falcon9_full_thrust().unwrap();
        let model = PhaseModel::new(PhaseKind::Boost2, &v, &earth);
        assert!(model.thrust_acceleration(v.stage2.burn_time).is_ok());
        assert!(matches!(
            model.thrust_acceleration(v.stage2.burn_time + 0.5),
            Err(SimError::NumericalInstability { .. })
        ));
    }

    #[test]
    fn impact_event_only_when_enabled() {
        let earth = Planet::earth();
        let v = presets::falcon9_full_thrust().unwrap();
        let y = Vector2::new(earth.radius + 10.0, -5.0);
        let model = PhaseModel::new(PhaseKind::Coast, &v, &earth);
        assert_eq!(model.event(0.0, &y), None);
        let model = model.with_impact_at(earth.radius);
        assert_relative_eq!(model.event(0.0, &y).unwrap(), 10.0);
    }

    #[test]
    fn phase_order_is_fixed() {
        assert_eq!(PhaseKind::Boost1.next(), Some(PhaseKind::Boost2));
        assert_eq!(PhaseKind::Boost2.next(), Some(PhaseKind::Coast));
        assert_eq!(PhaseKind::Coast.next(), None);
    }
}
