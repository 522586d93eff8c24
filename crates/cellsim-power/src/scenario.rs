//! Fixed reference networks for power-control studies.

use crate::gain::{GainMatrix, GainModel};
use crate::PowerControlError;
use cellsim_common::{Position, SimError, DEFAULT_BANDWIDTH_HZ};
use cellsim_radio::{noise_power, path_gain};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access point positions of the four-cell scenarios.
const ACCESS_POINTS: [(f64, f64); 4] = [(250.0, 750.0), (750.0, 750.0), (750.0, 250.0), (250.0, 250.0)];

/// User positions of the four-cell scenarios.
const USERS: [(f64, f64); 4] = [(225.83, 203.33), (566.79, 321.88), (765.51, 146.88), (265.95, 702.39)];

/// Shadowing coefficients `[user][access_point]`.
const SHADOWING: [[f64; 4]; 4] = [
    [5.3434e-2, 2.8731e-1, 1.9691e-2, 7.3013e-1],
    [3.2318, 1.5770, 2.6449e-1, 5.6379],
    [6.1470e-3, 1.1424, 2.6826e-1, 4.5709],
    [1.3485e-1, 4.6690e-1, 7.8250e-1, 1.6742],
];

/// Multipath amplitudes `[user][access_point]`.
const FADING: [[f64; 4]; 4] = [
    [1.248699, 3.248041, 0.772754, 0.708962],
    [0.498887, 0.104890, 0.647280, 0.940906],
    [0.382966, 0.682700, 1.891256, 0.327100],
    [0.065737, 0.649500, 1.981107, 1.259538],
];

/// Shrink factor of the interference-limited layout.
const INTERFERENCE_LIMITED_SCALE: f64 = 0.1;

/// Which reference network to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioKind {
    /// Two users on one access point with hand-picked gains.
    #[default]
    Default,
    /// Four cells of 500 m; noise dominates.
    NoiseLimited,
    /// The same layout shrunk tenfold; interference dominates.
    InterferenceLimited,
}

impl ScenarioKind {
    /// Every scenario, in listing order.
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::Default,
        ScenarioKind::NoiseLimited,
        ScenarioKind::InterferenceLimited,
    ];

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Default => "default",
            ScenarioKind::NoiseLimited => "noise-limited",
            ScenarioKind::InterferenceLimited => "interference-limited",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ScenarioKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ScenarioKind::ALL
            .into_iter()
            .find(|k| k.name() == normalized)
            .ok_or_else(|| SimError::UnknownName {
                kind: "scenario",
                name: s.to_string(),
            })
    }
}

/// A reference network ready for power control.
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    /// Scenario identity.
    pub kind: ScenarioKind,
    /// Access point positions; empty for [`ScenarioKind::Default`].
    pub access_points: Vec<Position>,
    /// User positions; empty for [`ScenarioKind::Default`].
    pub users: Vec<Position>,
    /// Gains, association and noise.
    pub model: GainModel,
    /// Total bandwidth in Hz.
    pub bandwidth_hz: f64,
    /// Channel count the bandwidth is split into.
    pub number_channels: u32,
}

/// Link gains and strongest-path association for users and access points.
///
/// `gain[u][a] = shadow[u][a] * k / max(d, d0)^n * fading[u][a]^2`; the
/// association ignores the fading term. Ties go to the lowest AP index.
pub fn gain_and_association(
    users: &[Position],
    access_points: &[Position],
    shadowing: &[Vec<f64>],
    fading: &[Vec<f64>],
) -> Result<(GainMatrix, Vec<usize>), PowerControlError> {
    for (what, matrix) in [("shadowing rows", shadowing), ("fading rows", fading)] {
        if matrix.len() != users.len() {
            return Err(PowerControlError::DimensionMismatch {
                what,
                expected: users.len(),
                actual: matrix.len(),
            });
        }
        if let Some(row) = matrix.iter().find(|row| row.len() != access_points.len()) {
            return Err(PowerControlError::DimensionMismatch {
                what,
                expected: access_points.len(),
                actual: row.len(),
            });
        }
    }

    let mut rows = Vec::with_capacity(users.len());
    let mut association = Vec::with_capacity(users.len());

    for (u, user) in users.iter().enumerate() {
        let mut row = Vec::with_capacity(access_points.len());
        let mut best: Option<(usize, f64)> = None;

        for (a, ap) in access_points.iter().enumerate() {
            let path = path_gain(user.distance_to(ap), shadowing[u][a]);
            row.push(path * fading[u][a] * fading[u][a]);
            match best {
                Some((_, b)) if path <= b => {}
                _ => best = Some((a, path)),
            }
        }

        let (serving, _) = best.ok_or(PowerControlError::DimensionMismatch {
            what: "access point count",
            expected: 1,
            actual: 0,
        })?;
        rows.push(row);
        association.push(serving);
    }

    Ok((GainMatrix::new(rows)?, association))
}

/// Build one of the reference networks.
pub fn get_scenario(kind: ScenarioKind) -> Result<Scenario, PowerControlError> {
    if kind == ScenarioKind::Default {
        let gain = GainMatrix::new(vec![vec![0.1], vec![0.05]])?;
        return Ok(Scenario {
            kind,
            access_points: Vec::new(),
            users: Vec::new(),
            model: GainModel::new(gain, vec![0, 0], 0.01)?,
            bandwidth_hz: DEFAULT_BANDWIDTH_HZ,
            number_channels: 1,
        });
    }

    let scale = if kind == ScenarioKind::InterferenceLimited {
        INTERFERENCE_LIMITED_SCALE
    } else {
        1.0
    };
    let access_points: Vec<Position> = ACCESS_POINTS
        .iter()
        .map(|&(x, y)| Position::new(x, y).scaled(scale))
        .collect();
    let users: Vec<Position> = USERS.iter().map(|&(x, y)| Position::new(x, y).scaled(scale)).collect();

    let shadowing: Vec<Vec<f64>> = SHADOWING.iter().map(|row| row.to_vec()).collect();
    let fading: Vec<Vec<f64>> = FADING.iter().map(|row| row.to_vec()).collect();
    let (gain, association) = gain_and_association(&users, &access_points, &shadowing, &fading)?;

    let number_channels = 1;
    Ok(Scenario {
        kind,
        access_points,
        users,
        model: GainModel::new(gain, association, noise_power(DEFAULT_BANDWIDTH_HZ, number_channels))?,
        bandwidth_hz: DEFAULT_BANDWIDTH_HZ,
        number_channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario() {
        let scenario = get_scenario(ScenarioKind::Default).unwrap();
        assert_eq!(scenario.model.association(), &[0, 0]);
        assert_eq!(scenario.model.noise_power(), 0.01);
        assert_eq!(scenario.model.gain().get(1, 0), Some(0.05));
    }

    #[test]
    fn test_noise_limited_association() {
        let scenario = get_scenario(ScenarioKind::NoiseLimited).unwrap();
        assert_eq!(scenario.model.association(), &[3, 3, 2, 0]);
        assert!((scenario.model.noise_power() - 1e-12).abs() < 1e-24);

        // User 0 sits about 53 m from the last access point
        let g = scenario.model.gain().get(0, 3).unwrap();
        assert!((g / 4.809627065940764e-12 - 1.0).abs() < 1e-6, "{}", g);
    }

    #[test]
    fn test_interference_limited_scales_gains() {
        let noise = get_scenario(ScenarioKind::NoiseLimited).unwrap();
        let interference = get_scenario(ScenarioKind::InterferenceLimited).unwrap();
        assert_eq!(interference.model.association(), noise.model.association());

        // Shrunk distances stay above the 1 m floor, so gains grow by 10^4
        for u in 0..4 {
            for a in 0..4 {
                let ratio = interference.model.gain().get(u, a).unwrap() / noise.model.gain().get(u, a).unwrap();
                assert!((ratio - 1e4).abs() < 1e-6, "ratio {} at ({}, {})", ratio, u, a);
            }
        }
    }

    #[test]
    fn test_association_ties_to_first() {
        let users = [Position::new(5.0, 0.0)];
        let aps = [Position::new(0.0, 0.0), Position::new(10.0, 0.0)];
        let (gain, association) =
            gain_and_association(&users, &aps, &[vec![1.0, 1.0]], &[vec![1.0, 2.0]]).unwrap();
        assert_eq!(association, vec![0]);
        assert!(gain.get(0, 1).unwrap() > gain.get(0, 0).unwrap());
    }

    #[test]
    fn test_gain_and_association_checks_shapes() {
        let users = [Position::new(5.0, 0.0)];
        let aps = [Position::new(0.0, 0.0)];
        assert!(gain_and_association(&users, &aps, &[vec![1.0, 1.0]], &[vec![1.0]]).is_err());
        assert!(gain_and_association(&users, &aps, &[], &[vec![1.0]]).is_err());
    }

    #[test]
    fn test_scenario_names() {
        for kind in ScenarioKind::ALL {
            assert_eq!(kind.to_string().parse::<ScenarioKind>().unwrap(), kind);
        }
        assert_eq!("Noise_Limited".parse::<ScenarioKind>().unwrap(), ScenarioKind::NoiseLimited);
        assert!("urban".parse::<ScenarioKind>().is_err());
    }
}
