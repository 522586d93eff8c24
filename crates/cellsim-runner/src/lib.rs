//! # cellsim-runner library
//!
//! Library interface for the cellsim command line runner.
//!
//! This module re-exports the pieces needed to run Monte-Carlo trials and
//! power-control studies programmatically and for integration testing.
//!
//! ## Trials
//!
//! Every trial builds one [`WirelessSystem`] from its own seeded RNG
//! (`base_seed + trial_index`), so a run is reproducible trial by trial and
//! trials never share random state.

pub mod export;

pub use export::{write_csv, write_json, CapacityUnit, SampleExport};

use cellsim_common::{trial_seed, SimError};
use cellsim_model::{Metric, ModelError, SimulationConfig, WirelessSystem};
use cellsim_power::{
    distributed_power_control, get_scenario, gradient_power_control, DpcConfig, GradientConfig, Objective,
    PowerControlError, ScenarioKind, Trajectory,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while running cellsim commands.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Model error.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Simulation error.
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    /// Power control error.
    #[error("Power control error: {0}")]
    PowerControl(#[from] PowerControlError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// ============================================================================
// Monte-Carlo Trials
// ============================================================================

/// Raw per-trial samples of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrialSamples {
    /// SINR values of each trial.
    pub sinr: Vec<Vec<f64>>,
    /// Capacity values (bit/s) of each trial.
    pub capacity: Vec<Vec<f64>>,
}

impl TrialSamples {
    /// Number of trials recorded.
    pub fn trials(&self) -> usize {
        self.sinr.len()
    }

    /// Samples of one metric, trial by trial.
    pub fn metric(&self, metric: Metric) -> &[Vec<f64>] {
        match metric {
            Metric::Sinr => &self.sinr,
            Metric::Capacity => &self.capacity,
        }
    }

    /// All samples of one metric in trial order.
    pub fn flattened(&self, metric: Metric) -> Vec<f64> {
        self.metric(metric).iter().flatten().copied().collect()
    }
}

/// Build and evaluate `config.trials` independent systems.
pub fn run_trials(config: &SimulationConfig) -> Result<TrialSamples, RunnerError> {
    if config.trials == 0 {
        return Err(RunnerError::ConfigError("at least one trial is required".to_string()));
    }
    config.system.validate()?;

    let mut samples = TrialSamples {
        sinr: Vec::with_capacity(config.trials),
        capacity: Vec::with_capacity(config.trials),
    };

    for index in 0..config.trials {
        let seed = trial_seed(config.seed, index as u64);
        let system = WirelessSystem::with_seed(&config.system, seed)?;
        let sinr = system.evaluate(Metric::Sinr)?;
        let capacity = system.evaluate(Metric::Capacity)?;
        trace!(trial = index, seed, ?sinr, "trial evaluated");

        samples.sinr.push(sinr);
        samples.capacity.push(capacity);
    }

    debug!(
        trials = config.trials,
        seed = config.seed,
        access_points = config.system.grid_side() * config.system.grid_side(),
        users = config.system.number_ue,
        policy = %config.system.policy,
        "Monte-Carlo run complete"
    );
    Ok(samples)
}

// ============================================================================
// Power Control Studies
// ============================================================================

/// Power-control algorithm to run on a reference scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMethod {
    /// Distributed target-SINR iteration.
    Dpc,
    /// Finite-difference gradient on an objective.
    Gradient,
}

impl fmt::Display for ControlMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlMethod::Dpc => write!(f, "dpc"),
            ControlMethod::Gradient => write!(f, "gradient"),
        }
    }
}

/// What to run in [`run_power_control`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerControlRequest {
    /// Reference network.
    pub scenario: ScenarioKind,
    /// Algorithm.
    pub method: ControlMethod,
    /// Gradient settings; the target SINR, limits and iteration count also
    /// drive the distributed method.
    pub gradient: GradientConfig,
}

/// Result of a power-control study, as written by `cellsim power-control`.
#[derive(Debug, Clone, Serialize)]
pub struct PowerControlReport {
    /// Reference network.
    pub scenario: ScenarioKind,
    /// Algorithm.
    pub method: ControlMethod,
    /// Objective of the gradient method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<Objective>,
    /// Serving access point of every user.
    pub association: Vec<usize>,
    /// SINR and power history.
    pub trajectory: Trajectory,
}

/// Run one power-control algorithm on a reference scenario.
pub fn run_power_control(request: &PowerControlRequest) -> Result<PowerControlReport, RunnerError> {
    let scenario = get_scenario(request.scenario)?;
    let settings = &request.gradient;

    let (trajectory, objective) = match request.method {
        ControlMethod::Dpc => {
            let config = DpcConfig {
                target_sinr: settings.target_sinr,
                limits: settings.limits,
                iterations: settings.iterations,
            };
            (distributed_power_control(&scenario.model, &config)?, None)
        }
        ControlMethod::Gradient => (
            gradient_power_control(&scenario.model, settings)?,
            Some(settings.objective),
        ),
    };

    debug!(
        scenario = %request.scenario,
        method = %request.method,
        rounds = trajectory.sinr.len(),
        "power control finished"
    );

    Ok(PowerControlReport {
        scenario: request.scenario,
        method: request.method,
        objective,
        association: scenario.model.association().to_vec(),
        trajectory,
    })
}
