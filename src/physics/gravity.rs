use serde::{Deserialize, Serialize};

use crate::error::SimError;

// ---------------------------------------------------------------------------
// Central body
// ---------------------------------------------------------------------------

pub const GRAVITATIONAL_CONSTANT: f64 = 6.674_08e-11; // m^3 kg^-1 s^-2
pub const EARTH_MASS: f64 = 5.972e24; // kg
pub const EARTH_RADIUS: f64 = 6_378_137.0; // equatorial radius, m

/// Point-mass planet the vehicle climbs away from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub name: String,
    pub gravitational_constant: f64, // m^3 kg^-1 s^-2
    pub mass: f64,                   // kg
    pub radius: f64,                 // m
}

impl Planet {
    pub fn earth() -> Self {
        Self {
            name: "Earth".into(),
            gravitational_constant: GRAVITATIONAL_CONSTANT,
            mass: EARTH_MASS,
            radius: EARTH_RADIUS,
        }
    }

    /// Standard gravitational parameter G·M, m^3/s^2.
    pub fn mu(&self) -> f64 {
        self.gravitational_constant * self.mass
    }

    /// Inverse-square gravitational acceleration magnitude at `radius` (m from centre).
    pub fn gravity_at(&self, radius: f64) -> f64 {
        self.mu() / (radius * radius)
    }

    /// Gravity at the surface. Used to turn specific impulse into exhaust velocity.
    pub fn surface_gravity(&self) -> f64 {
        self.gravity_at(self.radius)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let fields = [
            ("gravitational_constant", self.gravitational_constant),
            ("mass", self.mass),
            ("radius", self.radius),
        ];
        for (field, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::invalid(format!(
                    "planet {}: {} must be positive, got {}",
                    self.name, field, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for Planet {
    fn default() -> Self {
        Self::earth()
    }
}
