//! # cellsim Properties System
//!
//! A type-safe property registry for configuring simulation runs.
//!
//! ## Module Organization
//!
//! - [`value`] - Property value types and conversion traits
//! - [`types`] - Property type definitions and metadata
//! - [`definitions`] - All property constant definitions (easy to review in one place)
//! - [`registry`] - Property lookup and resolved/unresolved property sets
//!
//! ## Property Namespaces
//!
//! Properties are organized into namespaces using `/` as a separator:
//! - `system/access_points` - Number of access points
//! - `channel/policy` - Channel allocation policy
//! - `propagation/fading` - Rayleigh fading toggle
//!
//! ## Type-Safe Property Access
//!
//! ```ignore
//! use cellsim_model::properties::{ResolvedProperties, SYSTEM_CHANNELS};
//!
//! let props = ResolvedProperties::new();
//! let channels: u32 = props.get(&SYSTEM_CHANNELS)?;
//! ```
//!
//! ## Property Resolution
//!
//! Properties are resolved in the following order (later overrides earlier):
//! 1. Built-in code defaults
//! 2. YAML files (in order loaded)
//! 3. Command-line flags
//!
//! ## Example YAML
//!
//! ```yaml
//! system:
//!   access_points: 9
//!   users: 18
//!   channels: 3
//! channel:
//!   policy: imca
//! propagation:
//!   shadowing: true
//!   fading: true
//! ```

pub mod definitions;
pub mod registry;
pub mod types;
pub mod value;

pub use value::{FromPropertyValue, PropertyValue, ToPropertyValue};

pub use types::{Property, PropertyBaseType, PropertyDef, PropertyDefault};

pub use definitions::{
    // Channel
    CHANNEL_AGGREGATION,
    CHANNEL_POLICY,
    // Power
    POWER_CONTROL,
    POWER_FIXED_W,
    POWER_MAX_W,
    // Propagation
    PROPAGATION_FADING,
    PROPAGATION_SHADOWING,
    PROPAGATION_SHADOWING_SIGMA,
    // Simulation
    SIMULATION_SEED,
    SIMULATION_TRIALS,
    // System
    SYSTEM_ACCESS_POINTS,
    SYSTEM_BANDWIDTH_HZ,
    SYSTEM_CHANNELS,
    SYSTEM_SIZE_M,
    SYSTEM_USERS,
};

pub use registry::{
    get_property_def, is_known_property, known_namespaces, properties_by_namespace, PropertySetError,
    ResolvedProperties, UnresolvedProperties, ALL_PROPERTIES,
};
