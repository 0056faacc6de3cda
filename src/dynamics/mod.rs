pub mod phase;
pub mod state;

pub use phase::{MassModel, PhaseKind, PhaseModel};
pub use state::{PhaseState, SimConfig, DEFAULT_SAMPLES, DENSE_SAMPLES};
