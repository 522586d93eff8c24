//! Access point (base station) entity.

use crate::coefficients::{generate_multipath, generate_shadowing, ShadowingConfig};
use crate::propagation::noise_power;
use cellsim_common::{AccessPointId, Channel, Position, SimError, UserId};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Settings shared by every access point of a system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessPointConfig {
    /// Number of orthogonal channels.
    pub number_channels: u32,
    /// Total bandwidth in Hz, split evenly across channels.
    pub bandwidth_hz: f64,
    /// Log-normal shadowing settings.
    pub shadowing: ShadowingConfig,
    /// Draw Rayleigh multipath coefficients instead of constant ones.
    pub fading: bool,
}

/// A base station.
///
/// Owns the shadowing vector and the multipath matrix of every user in the
/// trial, indexed by global [`UserId`], whether or not the user associates
/// here. The membership list is filled by the system build pass.
#[derive(Debug, Clone, Serialize)]
pub struct AccessPoint {
    id: AccessPointId,
    position: Position,
    number_channels: u32,
    bandwidth_hz: f64,
    users: Vec<UserId>,
    shadow_coefficients: Vec<f64>,
    multipath_coefficients: Vec<Vec<f64>>,
}

impl AccessPoint {
    /// Create an access point from explicit coefficients.
    ///
    /// `multipath_coefficients` must hold one row per entry of
    /// `shadow_coefficients`, each with `number_channels` amplitudes.
    pub fn new(
        id: AccessPointId,
        position: Position,
        number_channels: u32,
        bandwidth_hz: f64,
        shadow_coefficients: Vec<f64>,
        multipath_coefficients: Vec<Vec<f64>>,
    ) -> Result<Self, SimError> {
        if number_channels == 0 {
            return Err(SimError::InvalidConfig(format!(
                "access point {} needs at least one channel",
                id
            )));
        }
        if multipath_coefficients.len() != shadow_coefficients.len() {
            return Err(SimError::ShapeMismatch {
                expected: format!("{} multipath rows", shadow_coefficients.len()),
                actual: format!("{} rows", multipath_coefficients.len()),
            });
        }
        if let Some(row) = multipath_coefficients
            .iter()
            .find(|row| row.len() != number_channels as usize)
        {
            return Err(SimError::ShapeMismatch {
                expected: format!("{} channels per multipath row", number_channels),
                actual: format!("{} channels", row.len()),
            });
        }

        Ok(AccessPoint {
            id,
            position,
            number_channels,
            bandwidth_hz,
            users: Vec::new(),
            shadow_coefficients,
            multipath_coefficients,
        })
    }

    /// Create an access point, drawing its coefficients for `number_ue` users.
    pub fn generate<R: Rng + ?Sized>(
        id: AccessPointId,
        position: Position,
        config: &AccessPointConfig,
        number_ue: usize,
        rng: &mut R,
    ) -> Result<Self, SimError> {
        let shadow = generate_shadowing(rng, number_ue, &config.shadowing)?;
        let multipath = generate_multipath(rng, number_ue, config.number_channels, config.fading)?;
        Self::new(id, position, config.number_channels, config.bandwidth_hz, shadow, multipath)
    }

    /// Get the access point ID.
    pub fn id(&self) -> AccessPointId {
        self.id
    }

    /// Get the access point position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Number of orthogonal channels.
    pub fn number_channels(&self) -> u32 {
        self.number_channels
    }

    /// All channels of this access point in ascending order.
    pub fn channels(&self) -> impl Iterator<Item = Channel> {
        Channel::all(self.number_channels)
    }

    /// Noise power of one channel in watts.
    pub fn noise_power(&self) -> f64 {
        noise_power(self.bandwidth_hz, self.number_channels)
    }

    /// Users associated with this access point, in association order.
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Register an associated user.
    pub fn attach_user(&mut self, user: UserId) {
        self.users.push(user);
    }

    /// Shadowing coefficient towards `user`.
    pub fn shadow_coefficient(&self, user: UserId) -> Result<f64, SimError> {
        self.shadow_coefficients
            .get(user.0)
            .copied()
            .ok_or(SimError::UserNotFound(user))
    }

    /// Multipath amplitudes of `user` on every channel.
    pub fn multipath_row(&self, user: UserId) -> Result<&[f64], SimError> {
        self.multipath_coefficients
            .get(user.0)
            .map(|row| row.as_slice())
            .ok_or(SimError::UserNotFound(user))
    }

    /// Multipath amplitude of `user` on `channel`.
    pub fn multipath_coefficient(&self, user: UserId, channel: Channel) -> Result<f64, SimError> {
        self.multipath_row(user)?
            .get(channel.index())
            .copied()
            .ok_or(SimError::ChannelOutOfRange {
                channel: channel.number(),
                number_channels: self.number_channels,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config(number_channels: u32, shadowing: bool, fading: bool) -> AccessPointConfig {
        AccessPointConfig {
            number_channels,
            bandwidth_hz: 100e6,
            shadowing: if shadowing {
                ShadowingConfig::with_sigma(2.0)
            } else {
                ShadowingConfig::disabled()
            },
            fading,
        }
    }

    #[test]
    fn test_noise_power() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let ap = AccessPoint::generate(AccessPointId(0), Position::new(500.0, 500.0), &config(2, false, false), 3, &mut rng).unwrap();
        assert!((ap.noise_power() - 5e-13).abs() < 1e-25);
    }

    #[test]
    fn test_generated_shapes_cover_population() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let ap = AccessPoint::generate(AccessPointId(1), Position::default(), &config(3, true, true), 6, &mut rng).unwrap();

        for user in 0..6 {
            assert!(ap.shadow_coefficient(UserId(user)).unwrap() > 0.0);
            assert_eq!(ap.multipath_row(UserId(user)).unwrap().len(), 3);
        }
        assert!(matches!(ap.shadow_coefficient(UserId(6)), Err(SimError::UserNotFound(_))));
        assert!(ap.users().is_empty());
    }

    #[test]
    fn test_multipath_channel_lookup() {
        let ap = AccessPoint::new(
            AccessPointId(0),
            Position::default(),
            2,
            100e6,
            vec![1.0],
            vec![vec![0.5, 1.5]],
        )
        .unwrap();

        let ch2 = Channel::new(2).unwrap();
        assert_eq!(ap.multipath_coefficient(UserId(0), ch2).unwrap(), 1.5);

        let ch3 = Channel::new(3).unwrap();
        assert!(matches!(
            ap.multipath_coefficient(UserId(0), ch3),
            Err(SimError::ChannelOutOfRange { channel: 3, number_channels: 2 })
        ));
    }

    #[test]
    fn test_generate_rejects_negative_sigma() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut bad = config(2, false, false);
        bad.shadowing = ShadowingConfig::with_sigma(-1.0);
        let result = AccessPoint::generate(AccessPointId(0), Position::default(), &bad, 3, &mut rng);
        assert!(matches!(result, Err(SimError::InvalidDistribution(_))));
    }

    #[test]
    fn test_rejects_mismatched_shapes() {
        let rows = AccessPoint::new(AccessPointId(0), Position::default(), 1, 1.0, vec![1.0, 1.0], vec![vec![1.0]]);
        assert!(matches!(rows, Err(SimError::ShapeMismatch { .. })));

        let cols = AccessPoint::new(AccessPointId(0), Position::default(), 2, 1.0, vec![1.0], vec![vec![1.0]]);
        assert!(matches!(cols, Err(SimError::ShapeMismatch { .. })));

        let none = AccessPoint::new(AccessPointId(0), Position::default(), 0, 1.0, vec![], vec![]);
        assert!(matches!(none, Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_membership_is_append_only() {
        let mut ap = AccessPoint::new(AccessPointId(0), Position::default(), 1, 1.0, vec![1.0; 3], vec![vec![1.0]; 3]).unwrap();
        ap.attach_user(UserId(2));
        ap.attach_user(UserId(0));
        assert_eq!(ap.users(), &[UserId(2), UserId(0)]);
    }
}
