use std::mem;

use crate::error::SimError;
use crate::physics::Planet;

/// Allowed relative mismatch between `mass_flow * burn_time` and the stated propellant load.
pub const MASS_BUDGET_TOLERANCE: f64 = 1e-3;

// ---------------------------------------------------------------------------
// Stage definition (one stage of the two-stage vehicle)
// ---------------------------------------------------------------------------

/// Immutable per-stage parameters. Built only through [`StageBuilder`], so every
/// `Stage` in circulation has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    pub dry_mass: f64,          // kg
    pub propellant_mass: f64,   // kg
    pub exhaust_velocity: f64,  // m/s, effective
    pub mass_flow: f64,         // kg/s
    pub burn_time: f64,         // s
}

impl Stage {
    pub fn wet_mass(&self) -> f64 {
        self.dry_mass + self.propellant_mass
    }

    pub fn thrust(&self) -> f64 {
        self.mass_flow * self.exhaust_velocity
    }

    /// Propellant consumed over the full stated burn.
    pub fn propellant_used(&self) -> f64 {
        self.mass_flow * self.burn_time
    }

    /// Ignition-to-burnout mass ratio with `payload_mass` riding on top.
    pub fn mass_ratio(&self, payload_mass: f64) -> f64 {
        let m0 = self.wet_mass() + payload_mass;
        let mf = m0 - self.propellant_used();
        m0 / mf
    }

    /// Ideal (vacuum, gravity-free) velocity gain.
    pub fn delta_v(&self, payload_mass: f64) -> f64 {
        self.exhaust_velocity * self.mass_ratio(payload_mass).ln()
    }
}

// ---------------------------------------------------------------------------
// Stage builder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Exhaust {
    Velocity(f64),
    SpecificImpulse(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Derived,
    MassFlow(f64),
    Thrust(f64),
}

/// Collects stage parameters in whichever form the source data uses
/// (Isp or exhaust velocity, thrust or mass flow) and resolves them on `build`.
#[derive(Debug, Clone)]
pub struct StageBuilder {
    name: String,
    dry_mass: f64,
    propellant_mass: f64,
    burn_time: f64,
    exhaust: Option<Exhaust>,
    flow: Flow,
    conflict: Option<&'static str>,
}

impl StageBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dry_mass: 0.0,
            propellant_mass: 0.0,
            burn_time: 0.0,
            exhaust: None,
            flow: Flow::Derived,
            conflict: None,
        }
    }

    pub fn dry_mass(mut self, v: f64) -> Self { self.dry_mass = v; self }
    pub fn propellant_mass(mut self, v: f64) -> Self { self.propellant_mass = v; self }
    pub fn burn_time(mut self, v: f64) -> Self { self.burn_time = v; self }
    pub fn exhaust_velocity(self, v: f64) -> Self { self.with_exhaust(Exhaust::Velocity(v)) }
    pub fn isp(self, v: f64) -> Self { self.with_exhaust(Exhaust::SpecificImpulse(v)) }
    pub fn mass_flow(self, v: f64) -> Self { self.with_flow(Flow::MassFlow(v)) }
    pub fn thrust(self, v: f64) -> Self { self.with_flow(Flow::Thrust(v)) }

    // Re-setting the same form replaces it; mixing forms is reported by `build`.
    fn with_exhaust(mut self, exhaust: Exhaust) -> Self {
        if let Some(prev) = self.exhaust {
            if mem::discriminant(&prev) != mem::discriminant(&exhaust) {
                self.conflict.get_or_insert("give exactly one of isp or exhaust velocity");
            }
        }
        self.exhaust = Some(exhaust);
        self
    }

    fn with_flow(mut self, flow: Flow) -> Self {
        if self.flow != Flow::Derived && mem::discriminant(&self.flow) != mem::discriminant(&flow) {
            self.conflict.get_or_insert("give at most one of thrust or mass flow");
        }
        self.flow = flow;
        self
    }

    /// Resolve derived quantities against `planet` and validate the result.
    pub fn build(self, planet: &Planet) -> Result<Stage, SimError> {
        let name = self.name;
        let fail = |msg: String| Err(SimError::invalid(format!("stage {name}: {msg}")));

        if let Some(conflict) = self.conflict {
            return fail(conflict.into());
        }

        if !(self.dry_mass.is_finite() && self.dry_mass > 0.0) {
            return fail(format!("dry mass must be > 0, got {}", self.dry_mass));
        }
        if !(self.propellant_mass.is_finite() && self.propellant_mass >= 0.0) {
            return fail(format!("propellant mass must be >= 0, got {}", self.propellant_mass));
        }
        if !(self.burn_time.is_finite() && self.burn_time > 0.0) {
            return fail(format!("burn duration must be > 0, got {}", self.burn_time));
        }

        let exhaust_velocity = match self.exhaust {
            Some(Exhaust::Velocity(ve)) => ve,
            Some(Exhaust::SpecificImpulse(isp)) => isp * planet.surface_gravity(),
            None => return fail("one of isp or exhaust velocity is required".into()),
        };
        if !(exhaust_velocity.is_finite() && exhaust_velocity > 0.0) {
            return fail(format!("exhaust velocity must be > 0, got {exhaust_velocity}"));
        }

        let mass_flow = match self.flow {
            Flow::Derived => self.propellant_mass / self.burn_time,
            Flow::MassFlow(m_dot) => m_dot,
            Flow::Thrust(thrust) => thrust / exhaust_velocity,
        };
        if !(mass_flow.is_finite() && mass_flow >= 0.0) {
            return fail(format!("mass flow must be >= 0, got {mass_flow}"));
        }

        let used = mass_flow * self.burn_time;
        let allowed = MASS_BUDGET_TOLERANCE * self.propellant_mass.max(1.0);
        if (used - self.propellant_mass).abs() > allowed {
            return fail(format!(
                "mass flow {:.3} kg/s over {:.1} s burns {:.1} kg, \
                 but {:.1} kg of propellant is loaded",
                mass_flow, self.burn_time, used, self.propellant_mass
            ));
        }

        Ok(Stage {
            name,
            dry_mass: self.dry_mass,
            propellant_mass: self.propellant_mass,
            exhaust_velocity,
            mass_flow,
            burn_time: self.burn_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn first_stage() -> StageBuilder {
        StageBuilder::new("S1")
            .dry_mass(25_600.0)
            .propellant_mass(395_700.0)
            .isp(282.0)
            .burn_time(162.0)
    }

    #[test]
    fn isp_converts_with_surface_gravity() {
        let earth = Planet::earth();
        let s = first_stage().build(&earth).unwrap();
        assert_relative_eq!(s.exhaust_velocity, 282.0 * earth.surface_gravity());
        assert_relative_eq!(s.mass_flow, 395_700.0 / 162.0);
        assert_relative_eq!(s.propellant_used(), s.propellant_mass, max_relative = 1e-12);
    }

    #[test]
    fn thrust_gives_mass_flow() {
        let earth = Planet::earth();
        let s = StageBuilder::new("S")
            .dry_mass(100.0)
            .propellant_mass(500.0)
            .exhaust_velocity(2500.0)
            .thrust(25_000.0)
            .burn_time(50.0)
            .build(&earth)
            .unwrap();
        assert_relative_eq!(s.mass_flow, 10.0);
        assert_relative_eq!(s.thrust(), 25_000.0);
    }

    #[test]
    fn rejects_non_positive_masses_and_durations() {
        let earth = Planet::earth();
        assert!(first_stage().dry_mass(0.0).build(&earth).is_err());
        assert!(first_stage().propellant_mass(-1.0).build(&earth).is_err());
        assert!(first_stage().burn_time(0.0).build(&earth).is_err());
        assert!(StageBuilder::new("no-exhaust")
            .dry_mass(1.0)
            .burn_time(1.0)
            .build(&earth)
            .is_err());
    }

    #[test]
    fn rejects_inconsistent_propellant_budget() {
        // published sea-level thrust burns ~446 t in 162 s against 395.7 t loaded
        let err = first_stage().thrust(7_607_000.0).build(&Planet::earth()).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("S1"));
    }

    #[test]
    fn mixed_parameter_forms_are_rejected() {
        let earth = Planet::earth();
        let err = first_stage().exhaust_velocity(2_765.0).build(&earth).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("isp or exhaust velocity"));

        let err = first_stage()
            .mass_flow(395_700.0 / 162.0)
            .thrust(6_700_000.0)
            .build(&earth)
            .unwrap_err();
        assert!(err.to_string().contains("thrust or mass flow"));

        // repeating the same form keeps the last value
        let s = first_stage().isp(100.0).isp(282.0).build(&earth).unwrap();
        assert_relative_eq!(s.exhaust_velocity, 282.0 * earth.surface_gravity());
    }

    #[test]
    fn zero_flow_stage_is_valid() {
        let s = StageBuilder::new("inert")
            .dry_mass(1_000.0)
            .propellant_mass(0.0)
            .isp(300.0)
            .mass_flow(0.0)
            .burn_time(30.0)
            .build(&Planet::earth())
            .unwrap();
        assert_eq!(s.thrust(), 0.0);
        assert_eq!(s.delta_v(0.0), 0.0);
    }

    #[test]
    fn delta_v_matches_rocket_equation() {
        let s = first_stage().build(&Planet::earth()).unwrap();
        let expected = s.exhaust_velocity * (421_300.0_f64 / 25_600.0).ln();
        assert_relative_eq!(s.delta_v(0.0), expected, max_relative = 1e-9);
    }
}
