//! # cellsim-model
//!
//! Network snapshot generation and configuration for cellsim.
//!
//! This crate provides:
//! - [`WirelessSystem`]: grid placement, association, channel allocation and
//!   SINR/capacity evaluation of one randomized trial
//! - Channel allocation policies ([`ChannelPolicy`])
//! - Typed configuration ([`SystemConfig`], [`SimulationConfig`])
//! - Property registry for configuring runs from YAML ([`properties`])
//!
//! ## Configuration
//!
//! Runs are configured through a flat namespace of properties (e.g.
//! `system/access_points`). YAML files nest the namespaces and are merged in
//! order; later files override earlier ones.

pub mod allocation;
pub mod config;
pub mod properties;
pub mod system;

pub use config::{load_properties, load_properties_from_str, ChannelPolicy, SimulationConfig, SystemConfig};
pub use properties::{PropertySetError, ResolvedProperties, UnresolvedProperties, ALL_PROPERTIES};
pub use system::{Metric, WirelessSystem};

use cellsim_common::SimError;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while configuring or building a system.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Simulation error.
    #[error(transparent)]
    Sim(#[from] SimError),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Property error.
    #[error("Property error: {0}")]
    Property(#[from] PropertySetError),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
