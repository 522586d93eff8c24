//! One randomized network snapshot and its SINR/capacity evaluation.

use crate::allocation;
use crate::config::{ChannelPolicy, SystemConfig};
use cellsim_common::{trial_rng, AccessPointId, Channel, Position, SimError, UserId};
use cellsim_radio::{shannon_capacity, AccessPoint, UserEquipment};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

// ============================================================================
// Metrics
// ============================================================================

/// Per-user quantity computed by [`WirelessSystem::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Signal to interference plus noise ratio (linear).
    Sinr,
    /// Shannon capacity in bit/s.
    Capacity,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Sinr => write!(f, "sinr"),
            Metric::Capacity => write!(f, "capacity"),
        }
    }
}

impl FromStr for Metric {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sinr" => Ok(Metric::Sinr),
            "capacity" => Ok(Metric::Capacity),
            _ => Err(SimError::UnknownName {
                kind: "metric",
                name: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Wireless System
// ============================================================================

/// Access points and users of a single trial.
///
/// All random draws happen in [`WirelessSystem::new`]; afterwards the system
/// is read-only.
#[derive(Debug, Clone, Serialize)]
pub struct WirelessSystem {
    config: SystemConfig,
    access_points: Vec<AccessPoint>,
    users: Vec<UserEquipment>,
}

impl WirelessSystem {
    /// Build a system, drawing everything from `rng`.
    pub fn new<R: Rng + ?Sized>(config: &SystemConfig, rng: &mut R) -> Result<Self, SimError> {
        config.validate()?;

        let mut access_points = place_access_points(config, rng)?;

        let user_config = config.user_config();
        let mut users = (0..config.number_ue)
            .map(|i| UserEquipment::place(UserId(i), &access_points, &user_config, rng))
            .collect::<Result<Vec<_>, _>>()?;

        for user in &users {
            access_points
                .get_mut(user.access_point().0)
                .ok_or(SimError::AccessPointNotFound(user.access_point()))?
                .attach_user(user.id());
        }

        match config.policy {
            ChannelPolicy::RoundRobin => {
                allocation::round_robin(&access_points, &mut users, config.number_channels, rng)?
            }
            ChannelPolicy::Papoa => allocation::papoa(&access_points, &mut users, config.number_channels)?,
            ChannelPolicy::Imca => allocation::imca(&access_points, &mut users)?,
            ChannelPolicy::Random => {}
        }

        if config.aggregation {
            allocation::apply_aggregation(&access_points, &mut users)?;
        }

        debug!(
            access_points = access_points.len(),
            users = users.len(),
            channels = config.number_channels,
            policy = %config.policy,
            "built wireless system"
        );

        Ok(WirelessSystem {
            config: config.clone(),
            access_points,
            users,
        })
    }

    /// Build a system from its own seeded random source.
    pub fn with_seed(config: &SystemConfig, seed: u64) -> Result<Self, SimError> {
        let mut rng = trial_rng(seed);
        Self::new(config, &mut rng)
    }

    /// Configuration the system was built from.
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Access points in grid order (row by row).
    pub fn access_points(&self) -> &[AccessPoint] {
        &self.access_points
    }

    /// Users by global index.
    pub fn users(&self) -> &[UserEquipment] {
        &self.users
    }

    /// Look up a user.
    pub fn user(&self, id: UserId) -> Result<&UserEquipment, SimError> {
        self.users.get(id.0).ok_or(SimError::UserNotFound(id))
    }

    /// Look up an access point.
    pub fn access_point(&self, id: AccessPointId) -> Result<&AccessPoint, SimError> {
        self.access_points.get(id.0).ok_or(SimError::AccessPointNotFound(id))
    }

    fn serving_access_point(&self, user: &UserEquipment) -> Result<&AccessPoint, SimError> {
        self.access_point(user.access_point())
    }

    /// Bandwidth of one channel in Hz.
    pub fn channel_bandwidth(&self) -> f64 {
        self.config.bandwidth_hz / self.config.number_channels as f64
    }

    /// Power received at the victim's access point from every other user on `channel`.
    pub fn sum_power_per_channel(&self, victim: UserId, channel: Channel) -> Result<f64, SimError> {
        let ap = self.serving_access_point(self.user(victim)?)?;

        let mut total = 0.0;
        for other in &self.users {
            if other.id() != victim && other.occupies(channel) {
                total += other.power_received_on(ap, channel)?;
            }
        }
        Ok(total)
    }

    /// SINR of `user` on `channel`, measured at its own access point.
    pub fn sinr(&self, user: UserId, channel: Channel) -> Result<f64, SimError> {
        let ue = self.user(user)?;
        let ap = self.serving_access_point(ue)?;
        let signal = ue.power_received_on(ap, channel)?;
        let interference = self.sum_power_per_channel(user, channel)?;
        Ok(signal / (interference + ap.noise_power()))
    }

    /// Shannon capacity in bit/s of `user` on `channel`.
    pub fn channel_capacity(&self, user: UserId, channel: Channel) -> Result<f64, SimError> {
        Ok(shannon_capacity(self.channel_bandwidth(), self.sinr(user, channel)?))
    }

    /// Metric values for every user in index order.
    ///
    /// An aggregating user contributes one SINR per channel, or a single
    /// capacity summed over its channels.
    pub fn evaluate(&self, metric: Metric) -> Result<Vec<f64>, SimError> {
        let mut values = Vec::with_capacity(self.users.len());

        for ue in &self.users {
            let id = ue.id();
            let own = ue.channel().channel().ok_or(SimError::ChannelUnassigned(id))?;

            if ue.is_aggregated() {
                let channels = Channel::all(self.config.number_channels);
                match metric {
                    Metric::Sinr => {
                        for channel in channels {
                            values.push(self.sinr(id, channel)?);
                        }
                    }
                    Metric::Capacity => {
                        let mut total = 0.0;
                        for channel in channels {
                            total += self.channel_capacity(id, channel)?;
                        }
                        values.push(total);
                    }
                }
            } else {
                values.push(match metric {
                    Metric::Sinr => self.sinr(id, own)?,
                    Metric::Capacity => self.channel_capacity(id, own)?,
                });
            }
        }

        Ok(values)
    }
}

/// Lay access points out on a square grid, each centred in its cell.
fn place_access_points<R: Rng + ?Sized>(config: &SystemConfig, rng: &mut R) -> Result<Vec<AccessPoint>, SimError> {
    let side = config.grid_side();
    if side * side != config.number_ap {
        warn!(
            requested = config.number_ap,
            placed = side * side,
            "access point count is not a perfect square, truncating grid"
        );
    }

    let cell = config.size_m / side as f64;
    let ap_config = config.access_point_config();

    let mut access_points = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            let position = Position::new(col as f64 * cell + cell / 2.0, row as f64 * cell + cell / 2.0);
            let id = AccessPointId(access_points.len());
            access_points.push(AccessPoint::generate(id, position, &ap_config, config.number_ue, rng)?);
        }
    }
    Ok(access_points)
}
