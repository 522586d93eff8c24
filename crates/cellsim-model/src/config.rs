//! Typed system configuration and YAML loading.

use crate::properties::*;
use crate::ModelError;
use cellsim_common::{SimError, DEFAULT_BANDWIDTH_HZ};
use cellsim_radio::{AccessPointConfig, ShadowingConfig, TransmitPower, UserConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// Channel Policy
// ============================================================================

/// How users get their channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelPolicy {
    /// Shuffled channels per access point, leftovers to the least used channel.
    #[default]
    RoundRobin,
    /// First users by index get their own channel, later ones their best fading channel.
    Papoa,
    /// Greedy choice of the channel with the least interference plus noise.
    Imca,
    /// Uniform channel drawn at user construction; no allocation pass.
    Random,
}

impl ChannelPolicy {
    /// Every policy, in listing order.
    pub const ALL: [ChannelPolicy; 4] = [
        ChannelPolicy::RoundRobin,
        ChannelPolicy::Papoa,
        ChannelPolicy::Imca,
        ChannelPolicy::Random,
    ];

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            ChannelPolicy::RoundRobin => "round-robin",
            ChannelPolicy::Papoa => "papoa",
            ChannelPolicy::Imca => "imca",
            ChannelPolicy::Random => "random",
        }
    }
}

impl fmt::Display for ChannelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ChannelPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ChannelPolicy::ALL
            .into_iter()
            .find(|p| p.name() == normalized)
            .ok_or_else(|| SimError::UnknownName {
                kind: "channel policy",
                name: s.to_string(),
            })
    }
}

// ============================================================================
// System Configuration
// ============================================================================

/// Parameters of one randomized system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Requested access point count (truncated to a perfect square).
    pub number_ap: usize,
    /// User count.
    pub number_ue: usize,
    /// Orthogonal channel count.
    pub number_channels: u32,
    /// Side of the square region in metres.
    pub size_m: f64,
    /// Total bandwidth in Hz.
    pub bandwidth_hz: f64,
    /// Channel allocation policy.
    pub policy: ChannelPolicy,
    /// Lone users transmit on every channel.
    pub aggregation: bool,
    /// Log-normal shadowing.
    pub shadowing: ShadowingConfig,
    /// Rayleigh fading.
    pub fading: bool,
    /// Transmit power rule.
    pub power: TransmitPower,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            number_ap: 64,
            number_ue: 1,
            number_channels: 1,
            size_m: 1000.0,
            bandwidth_hz: DEFAULT_BANDWIDTH_HZ,
            policy: ChannelPolicy::RoundRobin,
            aggregation: false,
            shadowing: ShadowingConfig::disabled(),
            fading: false,
            power: TransmitPower::Fixed(1.0),
        }
    }
}

impl SystemConfig {
    /// Build the configuration from resolved properties.
    pub fn from_properties(props: &ResolvedProperties) -> Result<Self, ModelError> {
        let shadowing = ShadowingConfig {
            enabled: props.get(&PROPAGATION_SHADOWING)?,
            sigma: props.get(&PROPAGATION_SHADOWING_SIGMA)?,
        };
        let power = if props.get(&POWER_CONTROL)? {
            TransmitPower::NoiseEqualizing {
                max_w: props.get(&POWER_MAX_W)?,
            }
        } else {
            TransmitPower::Fixed(props.get(&POWER_FIXED_W)?)
        };

        let config = SystemConfig {
            number_ap: props.get(&SYSTEM_ACCESS_POINTS)?,
            number_ue: props.get(&SYSTEM_USERS)?,
            number_channels: props.get(&SYSTEM_CHANNELS)?,
            size_m: props.get(&SYSTEM_SIZE_M)?,
            bandwidth_hz: props.get(&SYSTEM_BANDWIDTH_HZ)?,
            policy: props.get(&CHANNEL_POLICY)?.parse()?,
            aggregation: props.get(&CHANNEL_AGGREGATION)?,
            shadowing,
            fading: props.get(&PROPAGATION_FADING)?,
            power,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the parameters that would make a system meaningless.
    pub fn validate(&self) -> Result<(), SimError> {
        if grid_side(self.number_ap) == 0 {
            return Err(SimError::InvalidConfig(format!(
                "{} access points leave an empty grid",
                self.number_ap
            )));
        }
        if self.number_channels == 0 {
            return Err(SimError::InvalidConfig("at least one channel is required".to_string()));
        }
        if !(self.size_m.is_finite() && self.size_m > 0.0) {
            return Err(SimError::InvalidConfig(format!("region size must be positive, got {}", self.size_m)));
        }
        if !(self.bandwidth_hz.is_finite() && self.bandwidth_hz > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "bandwidth must be positive, got {}",
                self.bandwidth_hz
            )));
        }
        if self.shadowing.enabled && !(self.shadowing.sigma >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "shadowing sigma must be non-negative, got {}",
                self.shadowing.sigma
            )));
        }
        match self.power {
            TransmitPower::Fixed(p) if !(p >= 0.0) => {
                Err(SimError::InvalidConfig(format!("fixed power must be non-negative, got {}", p)))
            }
            TransmitPower::NoiseEqualizing { max_w } if !(max_w > 0.0) => {
                Err(SimError::InvalidConfig(format!("maximum power must be positive, got {}", max_w)))
            }
            _ => Ok(()),
        }
    }

    /// Access points per grid row (and column).
    pub fn grid_side(&self) -> usize {
        grid_side(self.number_ap)
    }

    /// Settings handed to every access point.
    pub fn access_point_config(&self) -> AccessPointConfig {
        AccessPointConfig {
            number_channels: self.number_channels,
            bandwidth_hz: self.bandwidth_hz,
            shadowing: self.shadowing,
            fading: self.fading,
        }
    }

    /// Settings handed to every user.
    pub fn user_config(&self) -> UserConfig {
        UserConfig {
            size_m: self.size_m,
            random_channel: self.policy == ChannelPolicy::Random,
            power: self.power,
        }
    }
}

/// Largest `s` with `s * s <= count`.
pub(crate) fn grid_side(count: usize) -> usize {
    let mut side = (count as f64).sqrt() as usize;
    while side * side > count {
        side -= 1;
    }
    while (side + 1) * (side + 1) <= count {
        side += 1;
    }
    side
}

// ============================================================================
// Run Configuration
// ============================================================================

/// A system configuration plus the Monte-Carlo settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Per-trial system parameters.
    pub system: SystemConfig,
    /// Number of trials.
    pub trials: usize,
    /// Base seed; trial `i` uses `seed + i`.
    pub seed: u64,
}

impl SimulationConfig {
    /// Build the configuration from resolved properties.
    pub fn from_properties(props: &ResolvedProperties) -> Result<Self, ModelError> {
        Ok(SimulationConfig {
            system: SystemConfig::from_properties(props)?,
            trials: props.get(&SIMULATION_TRIALS)?,
            seed: props.get(&SIMULATION_SEED)?,
        })
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load and merge property files. Later files override earlier ones.
pub fn load_properties(paths: &[&Path]) -> Result<ResolvedProperties, ModelError> {
    if paths.is_empty() {
        return Err(ModelError::InvalidConfig("No configuration files provided".to_string()));
    }

    let yaml_strings = paths
        .iter()
        .map(std::fs::read_to_string)
        .collect::<Result<Vec<String>, std::io::Error>>()?;
    let yaml_strs: Vec<&str> = yaml_strings.iter().map(|s| s.as_str()).collect();

    load_properties_from_str(&yaml_strs)
}

/// Parse and merge YAML property documents. Later documents override earlier ones.
///
/// An empty document contributes nothing.
pub fn load_properties_from_str(yaml_strs: &[&str]) -> Result<ResolvedProperties, ModelError> {
    if yaml_strs.is_empty() {
        return Err(ModelError::InvalidConfig("No configuration strings provided".to_string()));
    }

    let mut resolved = ResolvedProperties::new();
    for yaml_str in yaml_strs {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml_str)?;
        if value.is_null() {
            continue;
        }
        let unresolved: UnresolvedProperties = serde_yaml::from_value(value)?;
        resolved.apply_unresolved(&unresolved);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_properties() {
        let config = SystemConfig::from_properties(&ResolvedProperties::new()).unwrap();
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    fn test_policy_names() {
        assert_eq!("round-robin".parse::<ChannelPolicy>().unwrap(), ChannelPolicy::RoundRobin);
        assert_eq!("ROUND_ROBIN".parse::<ChannelPolicy>().unwrap(), ChannelPolicy::RoundRobin);
        assert_eq!("imca".parse::<ChannelPolicy>().unwrap(), ChannelPolicy::Imca);
        for policy in ChannelPolicy::ALL {
            assert_eq!(policy.to_string().parse::<ChannelPolicy>().unwrap(), policy);
        }
        assert!(matches!("greedy".parse::<ChannelPolicy>(), Err(SimError::UnknownName { .. })));
    }

    #[test]
    fn test_grid_side() {
        assert_eq!(grid_side(0), 0);
        assert_eq!(grid_side(1), 1);
        assert_eq!(grid_side(8), 2);
        assert_eq!(grid_side(9), 3);
        assert_eq!(grid_side(64), 8);
        assert_eq!(grid_side(99), 9);
    }

    #[test]
    fn test_validate_rejects_empty_grid() {
        let config = SystemConfig { number_ap: 0, ..SystemConfig::default() };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let config = SystemConfig { number_channels: 0, ..SystemConfig::default() };
        assert!(config.validate().is_err());

        let config = SystemConfig { number_ap: 5, ..SystemConfig::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_later_overrides_earlier() {
        let base = "system:\n  access_points: 9\n  users: 4\n";
        let overlay = "system:\n  users: 12\npower:\n  control: true\n  max_w: 0.5\n";
        let props = load_properties_from_str(&[base, "", overlay]).unwrap();
        let config = SystemConfig::from_properties(&props).unwrap();

        assert_eq!(config.number_ap, 9);
        assert_eq!(config.number_ue, 12);
        assert_eq!(config.power, TransmitPower::NoiseEqualizing { max_w: 0.5 });
    }

    #[test]
    fn test_unknown_policy_is_an_error() {
        let props = load_properties_from_str(&["channel:\n  policy: fastest\n"]).unwrap();
        assert!(matches!(SystemConfig::from_properties(&props), Err(ModelError::Sim(SimError::UnknownName { .. }))));
    }

    #[test]
    fn test_simulation_settings() {
        let props = load_properties_from_str(&["simulation:\n  trials: 25\n  seed: 7\n"]).unwrap();
        let config = SimulationConfig::from_properties(&props).unwrap();
        assert_eq!(config.trials, 25);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_random_policy_draws_channels_at_construction() {
        let config = SystemConfig { policy: ChannelPolicy::Random, ..SystemConfig::default() };
        assert!(config.user_config().random_channel);
        assert!(!SystemConfig::default().user_config().random_channel);
    }
}
