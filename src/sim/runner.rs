use tracing::{debug, info, info_span, warn};

use crate::dynamics::phase::{PhaseKind, PhaseModel};
use crate::dynamics::state::{PhaseState, SimConfig};
use crate::error::SimError;
use crate::vehicle::VehicleConfig;

use super::integrator::Integrator;
use super::trajectory::{Termination, Trajectory, TrajectorySample, TrajectorySegment};

// ---------------------------------------------------------------------------
// Staged driver: Boost1 -> Boost2 -> Coast
// ---------------------------------------------------------------------------

/// Runs the three phases in order, handing each terminal state to the next phase.
#[derive(Debug)]
pub struct TrajectoryDriver<'a> {
    vehicle: &'a VehicleConfig,
    config: &'a SimConfig,
    integrator: Integrator,
}

impl<'a> TrajectoryDriver<'a> {
    pub fn new(vehicle: &'a VehicleConfig, config: &'a SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self { vehicle, config, integrator: Integrator::new(config.tolerances) })
    }

    pub fn phase_duration(&self, kind: PhaseKind) -> f64 {
        match self.vehicle.stage(kind) {
            Some(stage) => stage.burn_time,
            None => self.config.coast_duration,
        }
    }

    pub fn phase_model(&self, kind: PhaseKind) -> PhaseModel {
        let model = PhaseModel::new(kind, self.vehicle, &self.config.planet);
        if self.config.detect_impact {
            model.with_impact_at(self.config.planet.radius)
        } else {
            model
        }
    }

    pub fn run(&self) -> Result<Trajectory, SimError> {
        let planet = &self.config.planet;
        let mut segments = Vec::with_capacity(PhaseKind::ALL.len());
        let mut initial = PhaseState::launch(planet);
        let (_, liftoff_accel) = self.phase_model(PhaseKind::Boost1).derivative(&initial)?;
        if !(liftoff_accel > 0.0) {
            return Err(SimError::invalid(format!(
                "{}: lift-off thrust does not exceed weight (net {liftoff_accel:.3} m/s^2)",
                self.vehicle.name
            )));
        }
        let mut origin = 0.0;
        let mut phase = Some(PhaseKind::Boost1);
        let mut termination = Termination::Completed;

        while let Some(kind) = phase {
            let (segment, impact) = self.run_phase(kind, origin, initial)?;
            let terminal = match segment.last() {
                Some(s) => *s,
                None => {
                    return Err(SimError::IntegrationFailure {
                        time: origin,
                        reason: format!("{kind} produced no samples"),
                    })
                }
            };
            segments.push(segment);

            if impact {
                warn!(phase = %kind, t = terminal.time, v = terminal.velocity, "simulated impact");
                termination = Termination::SimulatedImpact {
                    phase: kind,
                    time: terminal.time,
                    velocity: terminal.velocity,
                };
                break;
            }

            initial = terminal.state().hand_off();
            origin += self.phase_duration(kind);
            phase = kind.next();
        }

        info!(vehicle = %self.vehicle.name, ?termination, "trajectory complete");
        Ok(Trajectory {
            vehicle: self.vehicle.name.clone(),
            planet_radius: planet.radius,
            segments,
            termination,
        })
    }

    fn run_phase(
        &self,
        kind: PhaseKind,
        origin: f64,
        initial: PhaseState,
    ) -> Result<(TrajectorySegment, bool), SimError> {
        let _span = info_span!("phase", %kind).entered();
        let duration = self.phase_duration(kind);
        let model = self.phase_model(kind);
        model.preflight(duration)?;

        info!(
            t_ignition = origin,
            duration,
            altitude_km = initial.altitude(&self.config.planet) / 1000.0,
            velocity = initial.velocity,
            "phase start"
        );

        let solution = self.integrator.integrate(
            &model,
            0.0,
            initial.to_vector(),
            duration,
            self.config.samples_per_phase,
        )?;
        debug!(stats = ?solution.stats, "solver statistics");

        let mass = model.mass();
        let samples: Vec<TrajectorySample> = solution
            .samples
            .iter()
            .map(|(t, y)| TrajectorySample {
                phase: kind,
                time: origin + t,
                phase_time: *t,
                radius: y[0],
                velocity: y[1],
                mass: mass.at(*t),
            })
            .collect();

        if let Some(last) = samples.last() {
            info!(
                t_cutoff = last.time,
                altitude_km = last.altitude_km(self.config.planet.radius),
                velocity = last.velocity,
                mass = last.mass,
                "phase end"
            );
        }

        Ok((TrajectorySegment { kind, samples }, solution.event.is_some()))
    }
}

/// Fly `vehicle` through all three phases under `config`.
pub fn simulate(vehicle: &VehicleConfig, config: &SimConfig) -> Result<Trajectory, SimError> {
    TrajectoryDriver::new(vehicle, config)?.run()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
