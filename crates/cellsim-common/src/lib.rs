//! # cellsim-common
//!
//! Common types shared by the cellsim crates.
//!
//! This crate provides:
//! - Error type ([`SimError`])
//! - Physical constants of the propagation model ([`PATH_LOSS_EXPONENT`] and friends)
//! - Planar coordinates ([`Position`])
//! - Entity identification ([`UserId`], [`AccessPointId`])
//! - Channel assignment state ([`Channel`], [`ChannelAssignment`])
//! - Per-trial random sources ([`trial_rng`], [`trial_seed`])

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Simulation errors.
#[derive(Debug, Error)]
pub enum SimError {
    /// A user was queried on its assigned channel before allocation.
    #[error("User {0} has no assigned channel")]
    ChannelUnassigned(UserId),

    /// Channel outside `1..=number_channels`.
    #[error("Channel {channel} out of range (access point has {number_channels} channels)")]
    ChannelOutOfRange {
        /// Requested channel.
        channel: u32,
        /// Channels available.
        number_channels: u32,
    },

    /// Unknown user index.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Unknown access point index.
    #[error("Access point not found: {0}")]
    AccessPointNotFound(AccessPointId),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A random distribution could not be built from its parameters.
    #[error("Invalid distribution parameter: {0}")]
    InvalidDistribution(String),

    /// Coefficient vectors do not match the access point layout.
    #[error("Coefficient shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Unknown name for an enumerated option.
    #[error("Unknown {kind}: '{name}'")]
    UnknownName {
        /// What kind of option was looked up.
        kind: &'static str,
        /// The name that failed to resolve.
        name: String,
    },
}

// ============================================================================
// Physical Constants
// ============================================================================

/// Path-loss exponent `n`.
pub const PATH_LOSS_EXPONENT: i32 = 4;

/// Reference distance `d0` in metres. Distances are floored to this value.
pub const REFERENCE_DISTANCE_M: f64 = 1.0;

/// Path-loss scale `k` in m^4.
pub const PATH_LOSS_SCALE: f64 = 1e-4;

/// Thermal noise density `k0` in W/Hz.
pub const NOISE_DENSITY_W_PER_HZ: f64 = 1e-20;

/// Default total system bandwidth in Hz.
pub const DEFAULT_BANDWIDTH_HZ: f64 = 100e6;

// ============================================================================
// Geometry
// ============================================================================

/// Point in the simulation plane, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a new position.
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Euclidean distance to another position in metres.
    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Scale both coordinates by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Position::new(self.x * factor, self.y * factor)
    }
}

// ============================================================================
// Entity Types
// ============================================================================

/// Global index of a user equipment within one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub usize);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ue{}", self.0)
    }
}

/// Index of an access point within one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccessPointId(pub usize);

impl std::fmt::Display for AccessPointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ap{}", self.0)
    }
}

// ============================================================================
// Channels
// ============================================================================

/// Orthogonal channel number, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Channel(u32);

impl Channel {
    /// Create a channel from its 1-based number.
    ///
    /// Returns `None` for channel 0.
    pub fn new(number: u32) -> Option<Self> {
        (number > 0).then_some(Channel(number))
    }

    /// Create a channel from a 0-based index.
    pub fn from_index(index: usize) -> Self {
        Channel(index as u32 + 1)
    }

    /// 1-based channel number.
    pub fn number(&self) -> u32 {
        self.0
    }

    /// 0-based index into per-channel arrays.
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }

    /// All channels `1..=count` in ascending order.
    pub fn all(count: u32) -> impl Iterator<Item = Channel> {
        (1..=count).map(Channel)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Channel state of a user.
///
/// Allocation policies consume `Unassigned` users and produce `Assigned` ones.
/// Unassigned users never interfere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelAssignment {
    /// Waiting for the allocation pass.
    #[default]
    Unassigned,
    /// Transmitting on one channel.
    Assigned(Channel),
}

impl ChannelAssignment {
    /// The assigned channel, if any.
    pub fn channel(&self) -> Option<Channel> {
        match self {
            ChannelAssignment::Unassigned => None,
            ChannelAssignment::Assigned(channel) => Some(*channel),
        }
    }

    /// Check whether a channel has been assigned.
    pub fn is_assigned(&self) -> bool {
        matches!(self, ChannelAssignment::Assigned(_))
    }
}

// ============================================================================
// Random Sources
// ============================================================================

/// Seed for trial `index` of a run started from `base_seed`.
pub fn trial_seed(base_seed: u64, index: u64) -> u64 {
    base_seed.wrapping_add(index)
}

/// Random source owned by a single trial.
pub fn trial_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_position_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn test_position_scaled() {
        let p = Position::new(250.0, 750.0).scaled(0.1);
        assert!((p.x - 25.0).abs() < 1e-12);
        assert!((p.y - 75.0).abs() < 1e-12);
    }

    #[test]
    fn test_channel_numbering() {
        assert!(Channel::new(0).is_none());
        let ch = Channel::new(3).unwrap();
        assert_eq!(ch.number(), 3);
        assert_eq!(ch.index(), 2);
        assert_eq!(Channel::from_index(2), ch);

        let all: Vec<u32> = Channel::all(3).map(|c| c.number()).collect();
        assert_eq!(all, vec![1, 2, 3]);
    }

    #[test]
    fn test_channel_assignment_state() {
        let unassigned = ChannelAssignment::default();
        assert!(!unassigned.is_assigned());
        assert_eq!(unassigned.channel(), None);

        let assigned = ChannelAssignment::Assigned(Channel::from_index(0));
        assert!(assigned.is_assigned());
        assert_eq!(assigned.channel().map(|c| c.number()), Some(1));
    }

    #[test]
    fn test_trial_rng_is_reproducible() {
        let mut a = trial_rng(trial_seed(7, 3));
        let mut b = trial_rng(10);
        let xs: Vec<f64> = (0..8).map(|_| a.gen()).collect();
        let ys: Vec<f64> = (0..8).map(|_| b.gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_error_messages() {
        let err = SimError::ChannelUnassigned(UserId(4));
        assert_eq!(err.to_string(), "User ue4 has no assigned channel");

        let err = SimError::UnknownName { kind: "metric", name: "foo".to_string() };
        assert_eq!(err.to_string(), "Unknown metric: 'foo'");
    }
}
