//! User equipment entity.

use crate::access_point::AccessPoint;
use crate::propagation::path_gain;
use cellsim_common::{AccessPointId, Channel, ChannelAssignment, Position, SimError, UserId};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Transmit power rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransmitPower {
    /// Constant power in watts.
    Fixed(f64),
    /// Power that makes the received signal equal to the noise floor,
    /// capped at `max_w`.
    NoiseEqualizing {
        /// Upper bound in watts.
        max_w: f64,
    },
}

impl Default for TransmitPower {
    fn default() -> Self {
        TransmitPower::Fixed(1.0)
    }
}

/// Settings shared by every user of a system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Side of the square region in metres.
    pub size_m: f64,
    /// Draw the channel uniformly at construction.
    pub random_channel: bool,
    /// Transmit power rule.
    pub power: TransmitPower,
}

/// Index of the access point closest to `position`.
///
/// Ties go to the lowest index.
pub fn nearest_access_point(position: &Position, access_points: &[AccessPoint]) -> Result<AccessPointId, SimError> {
    let mut best: Option<(AccessPointId, f64)> = None;
    for ap in access_points {
        let distance = position.distance_to(&ap.position());
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((ap.id(), distance)),
        }
    }
    best.map(|(id, _)| id)
        .ok_or_else(|| SimError::InvalidConfig("no access points to associate with".to_string()))
}

/// A mobile user.
///
/// The association is fixed at construction. The channel may be assigned
/// later by an allocation pass.
#[derive(Debug, Clone, Serialize)]
pub struct UserEquipment {
    id: UserId,
    position: Position,
    access_point: AccessPointId,
    channel: ChannelAssignment,
    power_w: f64,
    aggregated: bool,
}

impl UserEquipment {
    /// Place a user uniformly in the region and associate it.
    pub fn place<R: Rng + ?Sized>(
        id: UserId,
        access_points: &[AccessPoint],
        config: &UserConfig,
        rng: &mut R,
    ) -> Result<Self, SimError> {
        let x = rng.gen::<f64>() * config.size_m;
        let y = rng.gen::<f64>() * config.size_m;
        Self::at_position(id, Position::new(x, y), access_points, config, rng)
    }

    /// Create a user at a known position and associate it.
    pub fn at_position<R: Rng + ?Sized>(
        id: UserId,
        position: Position,
        access_points: &[AccessPoint],
        config: &UserConfig,
        rng: &mut R,
    ) -> Result<Self, SimError> {
        let ap_id = nearest_access_point(&position, access_points)?;
        let ap = access_points
            .get(ap_id.0)
            .ok_or(SimError::AccessPointNotFound(ap_id))?;

        let channel = if config.random_channel {
            let number = rng.gen_range(1..=ap.number_channels());
            ChannelAssignment::Assigned(Channel::from_index(number as usize - 1))
        } else {
            ChannelAssignment::Unassigned
        };

        let mut user = UserEquipment {
            id,
            position,
            access_point: ap_id,
            channel,
            power_w: 0.0,
            aggregated: false,
        };

        user.power_w = match config.power {
            TransmitPower::Fixed(power) => power,
            TransmitPower::NoiseEqualizing { max_w } => (ap.noise_power() / user.path_gain(ap)?).min(max_w),
        };

        Ok(user)
    }

    /// Get the user ID.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Get the user position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Associated access point.
    pub fn access_point(&self) -> AccessPointId {
        self.access_point
    }

    /// Current channel state.
    pub fn channel(&self) -> ChannelAssignment {
        self.channel
    }

    /// Transmit power in watts, per channel when aggregating.
    pub fn power(&self) -> f64 {
        self.power_w
    }

    /// Whether this user transmits on every channel.
    pub fn is_aggregated(&self) -> bool {
        self.aggregated
    }

    /// Check whether the user transmits on `channel`.
    pub fn occupies(&self, channel: Channel) -> bool {
        match self.channel {
            ChannelAssignment::Unassigned => false,
            ChannelAssignment::Assigned(own) => self.aggregated || own == channel,
        }
    }

    /// Distance to an access point in metres.
    pub fn distance_to(&self, ap: &AccessPoint) -> f64 {
        self.position.distance_to(&ap.position())
    }

    /// Path gain towards `ap`, including shadowing.
    pub fn path_gain(&self, ap: &AccessPoint) -> Result<f64, SimError> {
        Ok(path_gain(self.distance_to(ap), ap.shadow_coefficient(self.id)?))
    }

    /// Power received at `ap` on the assigned channel.
    pub fn power_received(&self, ap: &AccessPoint) -> Result<f64, SimError> {
        let channel = self.channel.channel().ok_or(SimError::ChannelUnassigned(self.id))?;
        self.power_received_on(ap, channel)
    }

    /// Power received at `ap` on an explicit channel.
    pub fn power_received_on(&self, ap: &AccessPoint, channel: Channel) -> Result<f64, SimError> {
        let fading = ap.multipath_coefficient(self.id, channel)?;
        Ok(self.power_w * self.path_gain(ap)? * fading * fading)
    }

    /// Assign a channel.
    pub fn assign_channel(&mut self, channel: Channel) {
        self.channel = ChannelAssignment::Assigned(channel);
    }

    /// Spread the power over all `number_channels` channels.
    ///
    /// The user keeps its assigned channel as its nominal one.
    pub fn enable_aggregation(&mut self, number_channels: u32) {
        if self.aggregated || number_channels == 0 {
            return;
        }
        self.power_w /= number_channels as f64;
        self.aggregated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ap_at(id: usize, x: f64, y: f64, channels: u32, users: usize) -> AccessPoint {
        AccessPoint::new(
            AccessPointId(id),
            Position::new(x, y),
            channels,
            100e6,
            vec![1.0; users],
            vec![vec![1.0; channels as usize]; users],
        )
        .unwrap()
    }

    fn fixed_config() -> UserConfig {
        UserConfig {
            size_m: 1000.0,
            random_channel: false,
            power: TransmitPower::Fixed(1.0),
        }
    }

    #[test]
    fn test_nearest_access_point_ties_to_first() {
        let aps = vec![ap_at(0, 0.0, 0.0, 1, 1), ap_at(1, 10.0, 0.0, 1, 1), ap_at(2, 20.0, 0.0, 1, 1)];
        assert_eq!(nearest_access_point(&Position::new(5.0, 0.0), &aps).unwrap(), AccessPointId(0));
        assert_eq!(nearest_access_point(&Position::new(14.0, 3.0), &aps).unwrap(), AccessPointId(1));
        assert_eq!(nearest_access_point(&Position::new(30.0, 0.0), &aps).unwrap(), AccessPointId(2));
        assert!(nearest_access_point(&Position::default(), &[]).is_err());
    }

    #[test]
    fn test_placement_within_region() {
        let aps = vec![ap_at(0, 250.0, 250.0, 1, 50), ap_at(1, 750.0, 750.0, 1, 50)];
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for i in 0..50 {
            let ue = UserEquipment::place(UserId(i), &aps, &fixed_config(), &mut rng).unwrap();
            let p = ue.position();
            assert!((0.0..1000.0).contains(&p.x));
            assert!((0.0..1000.0).contains(&p.y));
            assert_eq!(ue.access_point(), nearest_access_point(&p, &aps).unwrap());
            assert!(!ue.channel().is_assigned());
        }
    }

    #[test]
    fn test_random_channel_in_range() {
        let aps = vec![ap_at(0, 500.0, 500.0, 4, 200)];
        let config = UserConfig { random_channel: true, ..fixed_config() };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut seen = [false; 4];
        for i in 0..200 {
            let ue = UserEquipment::place(UserId(i), &aps, &config, &mut rng).unwrap();
            let channel = ue.channel().channel().unwrap();
            assert!((1..=4).contains(&channel.number()));
            seen[channel.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_power_received_requires_channel() {
        let aps = vec![ap_at(0, 0.0, 0.0, 1, 1)];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ue = UserEquipment::at_position(UserId(0), Position::new(10.0, 0.0), &aps, &fixed_config(), &mut rng).unwrap();

        assert!(matches!(ue.power_received(&aps[0]), Err(SimError::ChannelUnassigned(UserId(0)))));

        ue.assign_channel(Channel::from_index(0));
        let received = ue.power_received(&aps[0]).unwrap();
        assert!((received - 1e-8).abs() < 1e-20);
    }

    #[test]
    fn test_power_received_uses_multipath_squared() {
        let ap = AccessPoint::new(
            AccessPointId(0),
            Position::default(),
            2,
            100e6,
            vec![2.0],
            vec![vec![1.0, 3.0]],
        )
        .unwrap();
        let aps = vec![ap];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let ue = UserEquipment::at_position(UserId(0), Position::new(0.5, 0.0), &aps, &fixed_config(), &mut rng).unwrap();

        // Distance floored to 1 m, so gain = 2 * 1e-4
        let on_ch2 = ue.power_received_on(&aps[0], Channel::from_index(1)).unwrap();
        assert!((on_ch2 - 2e-4 * 9.0).abs() < 1e-15);
    }

    #[test]
    fn test_noise_equalizing_power() {
        let aps = vec![ap_at(0, 0.0, 0.0, 1, 2)];
        let config = UserConfig {
            power: TransmitPower::NoiseEqualizing { max_w: 1.0 },
            ..fixed_config()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        // 10 m: gain 1e-8, noise 1e-12 -> 1e-4 W
        let near = UserEquipment::at_position(UserId(0), Position::new(10.0, 0.0), &aps, &config, &mut rng).unwrap();
        assert!((near.power() - 1e-4).abs() < 1e-16);

        // 1000 m: required power 1e4 W, capped
        let far = UserEquipment::at_position(UserId(1), Position::new(1000.0, 0.0), &aps, &config, &mut rng).unwrap();
        assert_eq!(far.power(), 1.0);
    }

    #[test]
    fn test_aggregation_occupies_every_channel() {
        let aps = vec![ap_at(0, 0.0, 0.0, 4, 1)];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ue = UserEquipment::at_position(UserId(0), Position::new(3.0, 4.0), &aps, &fixed_config(), &mut rng).unwrap();

        assert!(!ue.occupies(Channel::from_index(0)));

        ue.assign_channel(Channel::from_index(2));
        assert!(ue.occupies(Channel::from_index(2)));
        assert!(!ue.occupies(Channel::from_index(0)));

        ue.enable_aggregation(4);
        ue.enable_aggregation(4);
        assert!(ue.is_aggregated());
        assert_eq!(ue.power(), 0.25);
        assert!(aps[0].channels().all(|c| ue.occupies(c)));
    }
}
