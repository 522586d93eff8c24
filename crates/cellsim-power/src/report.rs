//! Per-user link figures for a given power vector.

use crate::scenario::Scenario;
use crate::PowerControlError;
use cellsim_radio::shannon_capacity;
use serde::Serialize;
use std::fmt;

/// Figures of one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserLink {
    /// User index.
    pub user: usize,
    /// Serving access point.
    pub access_point: usize,
    /// Transmit power in watts.
    pub power_w: f64,
    /// Linear SINR.
    pub sinr: f64,
    /// Shannon capacity in bit/s.
    pub capacity_bps: f64,
}

/// Capacity and energy efficiency of a scenario under fixed powers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkReport {
    /// Per-user figures.
    pub users: Vec<UserLink>,
    /// Sum of user capacities in bit/s.
    pub sum_capacity_bps: f64,
    /// Sum capacity over total transmit power, in bit/J.
    pub energy_efficiency_bits_per_joule: f64,
}

impl LinkReport {
    /// Evaluate `power` on `scenario`.
    pub fn new(scenario: &Scenario, power: &[f64]) -> Result<Self, PowerControlError> {
        if let Some(p) = power.iter().find(|p| !(p.is_finite() && **p >= 0.0)) {
            return Err(PowerControlError::InvalidParameter(format!(
                "transmit power must be finite and non-negative, got {}",
                p
            )));
        }
        let total_power: f64 = power.iter().sum();
        if total_power <= 0.0 {
            return Err(PowerControlError::InvalidParameter(
                "total transmit power must be positive".to_string(),
            ));
        }

        let sinr = scenario.model.sinr(power)?;
        let bandwidth = scenario.bandwidth_hz / scenario.number_channels as f64;

        let users: Vec<UserLink> = sinr
            .iter()
            .zip(power)
            .zip(scenario.model.association())
            .enumerate()
            .map(|(user, ((&sinr, &power_w), &access_point))| UserLink {
                user,
                access_point,
                power_w,
                sinr,
                capacity_bps: shannon_capacity(bandwidth, sinr),
            })
            .collect();

        let sum_capacity_bps: f64 = users.iter().map(|u| u.capacity_bps).sum();
        Ok(LinkReport {
            users,
            sum_capacity_bps,
            energy_efficiency_bits_per_joule: sum_capacity_bps / total_power,
        })
    }
}

impl fmt::Display for LinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for link in &self.users {
            writeln!(f, "UE {} (AP {})", link.user + 1, link.access_point + 1)?;
            writeln!(f, "  Power:            {} W", link.power_w)?;
            writeln!(f, "  SINR:             {:.2}", link.sinr)?;
            writeln!(f, "  Channel capacity: {:.2} Mbps", link.capacity_bps / 1e6)?;
        }
        writeln!(f)?;
        writeln!(f, "Sum capacity:      {:.2} Mbps", self.sum_capacity_bps / 1e6)?;
        write!(f, "Energy efficiency: {:.2} Mbits/J", self.energy_efficiency_bits_per_joule / 1e6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{get_scenario, ScenarioKind};

    #[test]
    fn test_default_report() {
        let scenario = get_scenario(ScenarioKind::Default).unwrap();
        // Powers that give user 0 an SINR of exactly 1
        let report = LinkReport::new(&scenario, &[0.6, 1.0]).unwrap();

        assert_eq!(report.users.len(), 2);
        assert!((report.users[0].sinr - 1.0).abs() < 1e-12);
        assert!((report.users[0].capacity_bps - 1e8).abs() < 1e-3);

        let expected_sum = report.users[0].capacity_bps + report.users[1].capacity_bps;
        assert_eq!(report.sum_capacity_bps, expected_sum);
        assert!((report.energy_efficiency_bits_per_joule - expected_sum / 1.6).abs() < 1e-3);
    }

    #[test]
    fn test_report_text() {
        let scenario = get_scenario(ScenarioKind::Default).unwrap();
        let text = LinkReport::new(&scenario, &[0.6, 1.0]).unwrap().to_string();
        assert!(text.contains("UE 1 (AP 1)"));
        assert!(text.contains("Channel capacity: 100.00 Mbps"));
        assert!(text.contains("Energy efficiency:"));
    }

    #[test]
    fn test_report_rejects_bad_power() {
        let scenario = get_scenario(ScenarioKind::NoiseLimited).unwrap();
        assert!(matches!(
            LinkReport::new(&scenario, &[1.0, 1.0]),
            Err(PowerControlError::DimensionMismatch { .. })
        ));
        assert!(LinkReport::new(&scenario, &[0.0; 4]).is_err());
        assert!(LinkReport::new(&scenario, &[1.0, -1.0, 1.0, 1.0]).is_err());
    }
}
