//! # cellsim-power
//!
//! Power control on fixed gain-matrix networks.
//!
//! This crate provides:
//! - SINR on a gain matrix ([`calculate_sinr`], [`GainModel`])
//! - Distributed power control ([`distributed_power_control`])
//! - Finite-difference gradient power control ([`gradient_power_control`])
//! - Reference networks ([`get_scenario`])
//! - Capacity and energy efficiency of a power vector ([`LinkReport`])

mod control;
mod gain;
mod report;
mod scenario;

pub use control::{
    distributed_power_control, gradient_power_control, DpcConfig, GradientConfig, Objective, PowerLimits, Trajectory,
};
pub use gain::{calculate_sinr, GainMatrix, GainModel};
pub use report::{LinkReport, UserLink};
pub use scenario::{gain_and_association, get_scenario, Scenario, ScenarioKind};

use cellsim_common::SimError;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors from power-control computations.
#[derive(Debug, Error)]
pub enum PowerControlError {
    /// Vector or matrix sizes do not line up.
    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// What was being compared.
        what: &'static str,
        /// Expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// A user is associated with an access point outside the gain matrix.
    #[error("User {user} is associated with access point {access_point}, but only {number_ap} exist")]
    AccessPointOutOfRange {
        /// User index.
        user: usize,
        /// Requested access point.
        access_point: usize,
        /// Access points available.
        number_ap: usize,
    },

    /// Power bounds with `pmin > pmax` or negative values.
    #[error("Invalid power limits: pmin {pmin}, pmax {pmax}")]
    InvalidLimits {
        /// Lower bound.
        pmin: f64,
        /// Upper bound.
        pmax: f64,
    },

    /// Other invalid numeric parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Simulation error.
    #[error(transparent)]
    Sim(#[from] SimError),
}
