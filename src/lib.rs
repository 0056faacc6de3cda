pub mod config;
pub mod dynamics;
pub mod error;
pub mod io;
pub mod physics;
pub mod sim;
pub mod vehicle;

pub use error::SimError;

// Flat re-exports of the pieces a caller needs to fly a vehicle
pub mod prelude {
    pub use crate::dynamics::{
        PhaseKind, PhaseModel, PhaseState, SimConfig, DEFAULT_SAMPLES, DENSE_SAMPLES,
    };
    pub use crate::error::SimError;
    pub use crate::physics::Planet;
    pub use crate::sim::{simulate, Termination, Trajectory, TrajectoryDriver};
    pub use crate::vehicle::{presets, Stage, StageBuilder, VehicleConfig};
}
