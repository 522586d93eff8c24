//! Iterative power control on a [`GainModel`].
//!
//! Both algorithms start every user at `pmax`, run a fixed number of rounds
//! and clamp every power to `[pmin, pmax]` after each round.

use crate::gain::GainModel;
use crate::PowerControlError;
use cellsim_common::SimError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

// ============================================================================
// Configuration
// ============================================================================

/// Allowed transmit power range in watts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLimits {
    /// Lower bound.
    pub pmin: f64,
    /// Upper bound and starting power.
    pub pmax: f64,
}

impl PowerLimits {
    /// Check `0 <= pmin <= pmax`.
    pub fn validate(&self) -> Result<(), PowerControlError> {
        if !(self.pmin >= 0.0 && self.pmin <= self.pmax && self.pmax.is_finite()) {
            return Err(PowerControlError::InvalidLimits {
                pmin: self.pmin,
                pmax: self.pmax,
            });
        }
        Ok(())
    }

    /// Clamp `power` into the range.
    pub fn clamp(&self, power: f64) -> f64 {
        power.min(self.pmax).max(self.pmin)
    }
}

impl Default for PowerLimits {
    fn default() -> Self {
        PowerLimits { pmin: 1e-3, pmax: 1.0 }
    }
}

/// Settings of [`distributed_power_control`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DpcConfig {
    /// SINR every user aims for.
    pub target_sinr: f64,
    /// Power range.
    pub limits: PowerLimits,
    /// Number of rounds.
    pub iterations: usize,
}

impl Default for DpcConfig {
    fn default() -> Self {
        DpcConfig {
            target_sinr: 1.0,
            limits: PowerLimits::default(),
            iterations: 50,
        }
    }
}

/// Quantity the gradient method optimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Objective {
    /// Sum of squared distances to the target SINR (minimized).
    #[default]
    Target,
    /// Smallest SINR (maximized).
    Min,
    /// Sum of SINRs (maximized).
    Sum,
    /// Smallest SINR times the sum of SINRs (maximized).
    MinSum,
}

impl Objective {
    /// Every objective, in listing order.
    pub const ALL: [Objective; 4] = [Objective::Target, Objective::Min, Objective::Sum, Objective::MinSum];

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Objective::Target => "target",
            Objective::Min => "min",
            Objective::Sum => "sum",
            Objective::MinSum => "min-sum",
        }
    }

    /// Whether the objective is maximized.
    pub fn maximizes(&self) -> bool {
        !matches!(self, Objective::Target)
    }

    /// Objective value for the given SINRs.
    pub fn evaluate(&self, sinr: &[f64], target_sinr: f64) -> f64 {
        let min = sinr.iter().copied().fold(f64::INFINITY, f64::min);
        let sum: f64 = sinr.iter().sum();
        match self {
            Objective::Target => sinr.iter().map(|s| (target_sinr - s).powi(2)).sum(),
            Objective::Min => min,
            Objective::Sum => sum,
            Objective::MinSum => min * sum,
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Objective {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "target" | "default" => Ok(Objective::Target),
            "min" | "j1" => Ok(Objective::Min),
            "sum" | "j2" => Ok(Objective::Sum),
            "min-sum" | "j3" => Ok(Objective::MinSum),
            _ => Err(SimError::UnknownName {
                kind: "objective",
                name: s.to_string(),
            }),
        }
    }
}

/// Settings of [`gradient_power_control`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientConfig {
    /// What to optimize.
    pub objective: Objective,
    /// Target SINR of [`Objective::Target`].
    pub target_sinr: f64,
    /// Power range.
    pub limits: PowerLimits,
    /// Number of steps.
    pub iterations: usize,
    /// Finite-difference step.
    pub eta: f64,
    /// Learning rate.
    pub mu: f64,
}

impl Default for GradientConfig {
    fn default() -> Self {
        GradientConfig {
            objective: Objective::Target,
            target_sinr: 1.0,
            limits: PowerLimits::default(),
            iterations: 200,
            eta: 1e-2,
            mu: 1e-2,
        }
    }
}

// ============================================================================
// Trajectory
// ============================================================================

/// History of a power-control run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trajectory {
    /// One SINR row per round.
    pub sinr: Vec<Vec<f64>>,
    /// Starting powers followed by one row per round.
    pub power: Vec<Vec<f64>>,
}

impl Trajectory {
    /// Powers after the last round.
    pub fn final_power(&self) -> Option<&[f64]> {
        self.power.last().map(|row| row.as_slice())
    }

    /// SINRs of the last round.
    pub fn final_sinr(&self) -> Option<&[f64]> {
        self.sinr.last().map(|row| row.as_slice())
    }
}

// ============================================================================
// Algorithms
// ============================================================================

/// Distributed power control.
///
/// Each round every user measures its SINR under the current powers and
/// scales its power by `target / sinr`. The SINR row records the measurement
/// that drove the update.
pub fn distributed_power_control(model: &GainModel, config: &DpcConfig) -> Result<Trajectory, PowerControlError> {
    config.limits.validate()?;

    let mut power = vec![config.limits.pmax; model.number_ue()];
    let mut trajectory = Trajectory {
        sinr: Vec::with_capacity(config.iterations),
        power: Vec::with_capacity(config.iterations + 1),
    };
    trajectory.power.push(power.clone());

    for round in 0..config.iterations {
        let sinr = model.sinr(&power)?;
        power = power
            .iter()
            .zip(&sinr)
            .map(|(p, s)| config.limits.clamp(p * config.target_sinr / s))
            .collect();
        trace!(round, ?sinr, ?power, "dpc round");

        trajectory.sinr.push(sinr);
        trajectory.power.push(power.clone());
    }

    debug!(iterations = config.iterations, final_sinr = ?trajectory.final_sinr(), "distributed power control done");
    Ok(trajectory)
}

/// Gradient power control with forward finite differences.
///
/// The gradient of the objective is estimated per user by perturbing its
/// power by `eta`. Maximized objectives step along the gradient, the target
/// error steps against it. The SINR row is measured after each step.
pub fn gradient_power_control(model: &GainModel, config: &GradientConfig) -> Result<Trajectory, PowerControlError> {
    config.limits.validate()?;
    if !(config.eta > 0.0) {
        return Err(PowerControlError::InvalidParameter(format!(
            "finite-difference step must be positive, got {}",
            config.eta
        )));
    }

    let objective = |power: &[f64]| -> Result<f64, PowerControlError> {
        Ok(config.objective.evaluate(&model.sinr(power)?, config.target_sinr))
    };
    let direction = if config.objective.maximizes() { 1.0 } else { -1.0 };

    let mut power = vec![config.limits.pmax; model.number_ue()];
    let mut trajectory = Trajectory {
        sinr: Vec::with_capacity(config.iterations),
        power: Vec::with_capacity(config.iterations + 1),
    };
    trajectory.power.push(power.clone());

    for round in 0..config.iterations {
        let base = objective(&power)?;

        let mut gradient = Vec::with_capacity(power.len());
        let mut perturbed = power.clone();
        for ue in 0..power.len() {
            perturbed[ue] += config.eta;
            gradient.push((objective(&perturbed)? - base) / config.eta);
            perturbed[ue] = power[ue];
        }

        power = power
            .iter()
            .zip(&gradient)
            .map(|(p, g)| config.limits.clamp(p + direction * config.mu * g))
            .collect();
        let sinr = model.sinr(&power)?;
        trace!(round, value = base, ?gradient, ?power, "gradient step");

        trajectory.sinr.push(sinr);
        trajectory.power.push(power.clone());
    }

    debug!(
        objective = %config.objective,
        iterations = config.iterations,
        final_sinr = ?trajectory.final_sinr(),
        "gradient power control done"
    );
    Ok(trajectory)
}
