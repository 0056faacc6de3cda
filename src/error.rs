use thiserror::Error;

use crate::config::ConfigError;
use crate::dynamics::phase::PhaseKind;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("numerical instability in {phase} at t={time:.3} s: {reason}")]
    NumericalInstability {
        phase: PhaseKind,
        time: f64,
        reason: String,
    },

    #[error("integration failed at t={time:.3} s: {reason}")]
    IntegrationFailure { time: f64, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SimError::InvalidConfiguration(msg.into())
    }
}
