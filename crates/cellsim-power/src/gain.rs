//! Gain-matrix link model.
//!
//! Every user interferes with every other user at the victim's access point;
//! there is no notion of channels here.

use crate::PowerControlError;
use serde::Serialize;

/// Link gains indexed `[user][access_point]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GainMatrix {
    rows: Vec<Vec<f64>>,
    number_ap: usize,
}

impl GainMatrix {
    /// Build from rows of equal length.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, PowerControlError> {
        let number_ap = rows.first().map(|row| row.len()).unwrap_or(0);
        if let Some(row) = rows.iter().find(|row| row.len() != number_ap) {
            return Err(PowerControlError::DimensionMismatch {
                what: "gain row length",
                expected: number_ap,
                actual: row.len(),
            });
        }
        Ok(GainMatrix { rows, number_ap })
    }

    /// Number of users (rows).
    pub fn number_ue(&self) -> usize {
        self.rows.len()
    }

    /// Number of access points (columns).
    pub fn number_ap(&self) -> usize {
        self.number_ap
    }

    /// Gain from `ue` to `ap`.
    pub fn get(&self, ue: usize, ap: usize) -> Option<f64> {
        self.rows.get(ue).and_then(|row| row.get(ap)).copied()
    }
}

/// SINR of user `ue` at access point `ap`.
///
/// `gain[ue][ap] * power[ue] / (noise + sum of gain[other][ap] * power[other])`.
pub fn calculate_sinr(
    gain: &GainMatrix,
    power: &[f64],
    ue: usize,
    ap: usize,
    noise_power: f64,
) -> Result<f64, PowerControlError> {
    if power.len() != gain.number_ue() {
        return Err(PowerControlError::DimensionMismatch {
            what: "power vector length",
            expected: gain.number_ue(),
            actual: power.len(),
        });
    }
    let signal = gain.get(ue, ap).ok_or(PowerControlError::AccessPointOutOfRange {
        user: ue,
        access_point: ap,
        number_ap: gain.number_ap(),
    })?;

    let mut interference = noise_power;
    for (other, p) in power.iter().enumerate() {
        if other != ue {
            // Every row has number_ap columns, and ap < number_ap was checked above
            interference += gain.rows[other][ap] * p;
        }
    }

    Ok(signal * power[ue] / interference)
}

/// Gains, association and noise of a fixed network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GainModel {
    gain: GainMatrix,
    association: Vec<usize>,
    noise_power: f64,
}

impl GainModel {
    /// Check that every user has a serving access point inside the matrix.
    pub fn new(gain: GainMatrix, association: Vec<usize>, noise_power: f64) -> Result<Self, PowerControlError> {
        if association.len() != gain.number_ue() {
            return Err(PowerControlError::DimensionMismatch {
                what: "association length",
                expected: gain.number_ue(),
                actual: association.len(),
            });
        }
        if let Some((user, &access_point)) = association.iter().enumerate().find(|(_, ap)| **ap >= gain.number_ap()) {
            return Err(PowerControlError::AccessPointOutOfRange {
                user,
                access_point,
                number_ap: gain.number_ap(),
            });
        }
        Ok(GainModel {
            gain,
            association,
            noise_power,
        })
    }

    /// Gain matrix.
    pub fn gain(&self) -> &GainMatrix {
        &self.gain
    }

    /// Serving access point per user.
    pub fn association(&self) -> &[usize] {
        &self.association
    }

    /// Noise power in watts.
    pub fn noise_power(&self) -> f64 {
        self.noise_power
    }

    /// Number of users.
    pub fn number_ue(&self) -> usize {
        self.gain.number_ue()
    }

    /// SINR of every user at its serving access point.
    pub fn sinr(&self, power: &[f64]) -> Result<Vec<f64>, PowerControlError> {
        self.association
            .iter()
            .enumerate()
            .map(|(ue, &ap)| calculate_sinr(&self.gain, power, ue, ap, self.noise_power))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_user() -> GainMatrix {
        GainMatrix::new(vec![vec![0.1], vec![0.05]]).unwrap()
    }

    #[test]
    fn test_calculate_sinr() {
        let gain = two_user();
        let sinr = calculate_sinr(&gain, &[1.0, 1.0], 0, 0, 0.01).unwrap();
        assert!((sinr - 0.1 / 0.06).abs() < 1e-12);

        let sinr = calculate_sinr(&gain, &[1.0, 1.0], 1, 0, 0.01).unwrap();
        assert!((sinr - 0.05 / 0.11).abs() < 1e-12);
    }

    #[test]
    fn test_single_user_is_noise_limited() {
        let gain = GainMatrix::new(vec![vec![2.0, 0.5]]).unwrap();
        assert_eq!(calculate_sinr(&gain, &[3.0], 0, 1, 0.5).unwrap(), 3.0);
    }

    #[test]
    fn test_dimension_errors() {
        let gain = two_user();
        assert!(matches!(
            calculate_sinr(&gain, &[1.0], 0, 0, 0.01),
            Err(PowerControlError::DimensionMismatch { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            calculate_sinr(&gain, &[1.0, 1.0], 0, 1, 0.01),
            Err(PowerControlError::AccessPointOutOfRange { access_point: 1, .. })
        ));
        assert!(GainMatrix::new(vec![vec![1.0, 2.0], vec![1.0]]).is_err());
    }

    #[test]
    fn test_model_validates_association() {
        assert!(matches!(
            GainModel::new(two_user(), vec![0], 0.01),
            Err(PowerControlError::DimensionMismatch { what: "association length", .. })
        ));
        assert!(matches!(
            GainModel::new(two_user(), vec![0, 3], 0.01),
            Err(PowerControlError::AccessPointOutOfRange { user: 1, access_point: 3, number_ap: 1 })
        ));

        let model = GainModel::new(two_user(), vec![0, 0], 0.01).unwrap();
        let sinr = model.sinr(&[1.0, 1.0]).unwrap();
        assert_eq!(sinr.len(), 2);
        assert!(sinr[0] > sinr[1]);
    }
}
