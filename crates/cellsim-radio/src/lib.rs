//! # cellsim-radio
//!
//! Radio entities for cellsim.
//!
//! This crate provides:
//! - Distance-based path gain, noise and capacity ([`path_gain`], [`noise_power`], [`shannon_capacity`])
//! - Shadowing and multipath coefficient generation ([`generate_shadowing`], [`generate_multipath`])
//! - Base stations ([`AccessPoint`])
//! - Mobile devices ([`UserEquipment`]) and nearest-AP association ([`nearest_access_point`])

mod access_point;
mod coefficients;
mod propagation;
mod user_equipment;

pub use access_point::{AccessPoint, AccessPointConfig};
pub use coefficients::{generate_multipath, generate_shadowing, ShadowingConfig, DEFAULT_SHADOWING_SIGMA};
pub use propagation::{noise_power, path_gain, shannon_capacity};
pub use user_equipment::{nearest_access_point, TransmitPower, UserConfig, UserEquipment};

// Re-export common types
pub use cellsim_common::{AccessPointId, Channel, ChannelAssignment, Position, SimError, UserId};
