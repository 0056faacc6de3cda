pub mod gravity;

pub use gravity::Planet;
