pub mod stage;
pub mod mission;

pub use stage::{Stage, StageBuilder, MASS_BUDGET_TOLERANCE};
pub use mission::{VehicleConfig, presets};
