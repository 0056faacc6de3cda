use crate::dynamics::phase::PhaseKind;
use crate::error::SimError;

use super::stage::Stage;

// ---------------------------------------------------------------------------
// VehicleConfig: two stages plus payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleConfig {
    pub name: String,
    pub stage1: Stage,
    pub stage2: Stage,
    pub payload_mass: f64, // kg
}

impl VehicleConfig {
    pub fn new(
        name: impl Into<String>,
        stage1: Stage,
        stage2: Stage,
        payload_mass: f64,
    ) -> Result<Self, SimError> {
        let name = name.into();
        if !(payload_mass.is_finite() && payload_mass >= 0.0) {
            return Err(SimError::invalid(format!(
                "vehicle {name}: payload mass must be >= 0, got {payload_mass}"
            )));
        }
        Ok(Self { name, stage1, stage2, payload_mass })
    }

    pub fn liftoff_mass(&self) -> f64 {
        self.stage1.wet_mass() + self.stage2.wet_mass() + self.payload_mass
    }

    /// Mass the burning stage has to push at ignition of `kind`: the stage itself
    /// plus everything stacked above it. Nothing is burning during the coast.
    pub fn upper_system_mass(&self, kind: PhaseKind) -> f64 {
        match kind {
            PhaseKind::Boost1 => self.liftoff_mass(),
            PhaseKind::Boost2 => self.stage2.wet_mass() + self.payload_mass,
            PhaseKind::Coast => 0.0,
        }
    }

    /// Body left coasting after the second burn: the payload, or the spent
    /// second stage when the vehicle flies without one.
    pub fn coasting_mass(&self) -> f64 {
        if self.payload_mass > 0.0 {
            self.payload_mass
        } else {
            self.stage2.dry_mass
        }
    }

    pub fn stage(&self, kind: PhaseKind) -> Option<&Stage> {
        match kind {
            PhaseKind::Boost1 => Some(&self.stage1),
            PhaseKind::Boost2 => Some(&self.stage2),
            PhaseKind::Coast => None,
        }
    }

    /// Total ideal delta-v, each stage pushing everything above it.
    pub fn total_delta_v(&self) -> f64 {
        self.stage1.delta_v(self.stage2.wet_mass() + self.payload_mass)
            + self.stage2.delta_v(self.payload_mass)
    }
}

// ---------------------------------------------------------------------------
// Preset vehicles
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;
    use crate::physics::Planet;
    use crate::vehicle::StageBuilder;

    pub const CREW_DRAGON_MASS: f64 = 28_184.0; // kg

    fn falcon9_stages(planet: &Planet) -> Result<(Stage, Stage), SimError> {
        let s1 = StageBuilder::new("S1-Merlin")
            .dry_mass(25_600.0)
            .propellant_mass(395_700.0)
            .isp(282.0)
            .burn_time(162.0)
            .build(planet)?;
        let s2 = StageBuilder::new("S2-MVac")
            .dry_mass(3_900.0)
            .propellant_mass(105_189.0)
            .isp(348.0)
            .burn_time(397.0)
            .build(planet)?;
        Ok((s1, s2))
    }

    /// Falcon 9 v1.2 Full Thrust flying without payload.
    pub fn falcon9_full_thrust() -> Result<VehicleConfig, SimError> {
        let (s1, s2) = falcon9_stages(&Planet::earth())?;
        VehicleConfig::new("Falcon 9 Full Thrust", s1, s2, 0.0)
    }

    /// Falcon 9 lofting a Crew Dragon capsule.
    pub fn falcon9_crew_dragon() -> Result<VehicleConfig, SimError> {
        let (s1, s2) = falcon9_stages(&Planet::earth())?;
        VehicleConfig::new("Falcon 9 / Crew Dragon", s1, s2, CREW_DRAGON_MASS)
    }

    /// First-draft numbers: stated mass flow does not add up to the loaded
    /// propellant on either stage, so this never builds.
    pub fn falcon9_legacy() -> Result<VehicleConfig, SimError> {
        let planet = Planet::earth();
        let s1 = StageBuilder::new("S1-legacy")
            .dry_mass(52_000.0)
            .propellant_mass(370_000.0)
            .exhaust_velocity(2_943.0)
            .mass_flow(2_312.5)
            .burn_time(162.0)
            .build(&planet)?;
        let s2 = StageBuilder::new("S2-legacy")
            .dry_mass(20_000.0)
            .propellant_mass(108_000.0)
            .exhaust_velocity(3_433.5)
            .mass_flow(270.0)
            .burn_time(397.0)
            .build(&planet)?;
        VehicleConfig::new("Falcon 9 (legacy draft)", s1, s2, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn upper_system_mass_by_phase() {
        let v = presets::falcon9_crew_dragon().unwrap();
        assert_relative_eq!(
            v.upper_system_mass(PhaseKind::Boost1),
            421_300.0 + 109_089.0 + presets::CREW_DRAGON_MASS
        );
        assert_relative_eq!(
            v.upper_system_mass(PhaseKind::Boost2),
            109_089.0 + presets::CREW_DRAGON_MASS
        );
        assert_eq!(v.upper_system_mass(PhaseKind::Coast), 0.0);
        assert_eq!(v.coasting_mass(), presets::CREW_DRAGON_MASS);
    }

    #[test]
    fn coasting_mass_without_payload_is_spent_upper_stage() {
        let v = presets::falcon9_full_thrust().unwrap();
        assert_eq!(v.coasting_mass(), 3_900.0);
    }

    #[test]
    fn legacy_preset_is_rejected() {
        assert!(matches!(
            presets::falcon9_legacy(),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn negative_payload_rejected() {
        let v = presets::falcon9_full_thrust().unwrap();
        assert!(VehicleConfig::new("bad", v.stage1, v.stage2, -5.0).is_err());
    }

    #[test]
    fn two_stage_delta_v_exceeds_either_stage() {
        let v = presets::falcon9_crew_dragon().unwrap();
        let dv = v.total_delta_v();
        assert!(dv > v.stage2.delta_v(v.payload_mass));
        assert!(dv > 5_000.0 && dv < 15_000.0, "delta-v {dv:.0} m/s");
    }
}
