//! Property constant definitions.
//!
//! The description string is what `cellsim properties` prints, so it must be
//! self-contained: what the property controls and which values it accepts.
//!
//! ## Property Categories
//!
//! - **System** - Network dimensions (access points, users, channels, region)
//! - **Channel** - Channel allocation policy and aggregation
//! - **Propagation** - Shadowing and fading toggles
//! - **Power** - Transmit power rule
//! - **Simulation** - Trial count and seed

use super::types::{Property, PropertyDefault};

// ============================================================================
// System Properties
// ============================================================================

/// Number of access points.
pub const SYSTEM_ACCESS_POINTS: Property<usize> = Property::new(
    "system/access_points",
    "Number of access points. They are laid out on a square grid; a count that is not a perfect square is truncated to the largest perfect square below it",
    PropertyDefault::Integer(64),
);

/// Number of users per trial.
pub const SYSTEM_USERS: Property<usize> = Property::new(
    "system/users",
    "Number of user equipments placed uniformly in the region per trial",
    PropertyDefault::Integer(1),
);

/// Number of orthogonal channels.
pub const SYSTEM_CHANNELS: Property<u32> = Property::new(
    "system/channels",
    "Number of orthogonal channels the bandwidth is split into (at least 1)",
    PropertyDefault::Integer(1),
);

/// Side of the square region.
pub const SYSTEM_SIZE_M: Property<f64> = Property::new(
    "system/size_m",
    "Side length of the square simulation region",
    PropertyDefault::Float(1000.0),
)
.with_unit("m");

/// Total bandwidth.
pub const SYSTEM_BANDWIDTH_HZ: Property<f64> = Property::new(
    "system/bandwidth_hz",
    "Total system bandwidth, split evenly across channels",
    PropertyDefault::Float(100e6),
)
.with_unit("Hz");

// ============================================================================
// Channel Properties
// ============================================================================

/// Channel allocation policy name.
pub const CHANNEL_POLICY: Property<String> = Property::new(
    "channel/policy",
    "Channel allocation policy: 'round-robin' (shuffled per access point, leftovers to the least used channel), 'papoa' (fading-aware direct mapping), 'imca' (greedy interference minimization) or 'random' (uniform channel drawn per user)",
    PropertyDefault::String("round-robin"),
);

/// Channel aggregation for lone users.
pub const CHANNEL_AGGREGATION: Property<bool> = Property::new(
    "channel/aggregation",
    "When true, a user that is alone at its access point transmits on every channel with its power split evenly",
    PropertyDefault::Bool(false),
);

// ============================================================================
// Propagation Properties
// ============================================================================

/// Log-normal shadowing toggle.
pub const PROPAGATION_SHADOWING: Property<bool> = Property::new(
    "propagation/shadowing",
    "Draw a log-normal shadowing coefficient per access point and user. When false all coefficients are 1",
    PropertyDefault::Bool(false),
);

/// Spread of the log-normal shadowing.
pub const PROPAGATION_SHADOWING_SIGMA: Property<f64> = Property::new(
    "propagation/shadowing_sigma",
    "Standard deviation of the normal underlying the log-normal shadowing (mean 0). Only used when shadowing is enabled",
    PropertyDefault::Float(2.0),
);

/// Rayleigh fading toggle.
pub const PROPAGATION_FADING: Property<bool> = Property::new(
    "propagation/fading",
    "Draw a Rayleigh multipath amplitude per access point, user and channel. When false all amplitudes are 1",
    PropertyDefault::Bool(false),
);

// ============================================================================
// Power Properties
// ============================================================================

/// Noise-equalizing power control toggle.
pub const POWER_CONTROL: Property<bool> = Property::new(
    "power/control",
    "When true each user transmits the power that brings its received signal to the noise floor, capped at power/max_w. When false every user transmits power/fixed_w",
    PropertyDefault::Bool(false),
);

/// Fixed transmit power.
pub const POWER_FIXED_W: Property<f64> = Property::new(
    "power/fixed_w",
    "Transmit power of every user when power control is disabled",
    PropertyDefault::Float(1.0),
)
.with_unit("W");

/// Power control cap.
pub const POWER_MAX_W: Property<f64> = Property::new(
    "power/max_w",
    "Upper bound on the transmit power when power control is enabled",
    PropertyDefault::Float(1.0),
)
.with_unit("W");

// ============================================================================
// Simulation Properties
// ============================================================================

/// Monte-Carlo trial count.
pub const SIMULATION_TRIALS: Property<usize> = Property::new(
    "simulation/trials",
    "Number of independent randomized systems built per run",
    PropertyDefault::Integer(1000),
);

/// Base random seed.
pub const SIMULATION_SEED: Property<u64> = Property::new(
    "simulation/seed",
    "Base random seed. Trial i uses seed + i, so runs are reproducible",
    PropertyDefault::Integer(0),
);
