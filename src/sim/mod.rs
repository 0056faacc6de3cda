pub mod event;
pub mod integrator;
pub mod runner;
pub mod trajectory;

pub use integrator::{Integrator, OdeSystem, Solution, Stats, Tolerances};
pub use runner::{simulate, TrajectoryDriver};
pub use trajectory::{
    PhaseCurve, PhaseCurves, Termination, Trajectory, TrajectorySample, TrajectorySegment,
};
