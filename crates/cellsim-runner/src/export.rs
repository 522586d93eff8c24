//! Output of Monte-Carlo samples.
//!
//! Samples are written raw, with no statistics applied, in one of two shapes:
//!
//! - JSON: the run configuration plus one flat list per metric.
//! - CSV: long format, one `trial,metric,value` row per sample.

use crate::{RunnerError, TrialSamples};
use cellsim_model::{Metric, SimulationConfig};
use serde::Serialize;
use std::io::Write;

/// Unit capacities are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CapacityUnit {
    /// Bits per second.
    #[default]
    #[serde(rename = "bps")]
    BitsPerSecond,
    /// Megabits per second.
    #[serde(rename = "Mbps")]
    Mbps,
}

impl CapacityUnit {
    /// Convert from bit/s.
    pub fn convert(&self, bits_per_second: f64) -> f64 {
        match self {
            CapacityUnit::BitsPerSecond => bits_per_second,
            CapacityUnit::Mbps => bits_per_second / 1e6,
        }
    }

    /// Metric name used in CSV rows.
    fn csv_metric(&self) -> &'static str {
        match self {
            CapacityUnit::BitsPerSecond => "capacity_bps",
            CapacityUnit::Mbps => "capacity_mbps",
        }
    }
}

/// JSON document written by `cellsim run`.
#[derive(Debug, Clone, Serialize)]
pub struct SampleExport<'a> {
    /// Configuration the samples were drawn with.
    pub config: &'a SimulationConfig,
    /// Unit of `capacity`.
    pub capacity_unit: CapacityUnit,
    /// SINR samples of all trials, in trial order.
    pub sinr: Vec<f64>,
    /// Capacity samples of all trials, in trial order.
    pub capacity: Vec<f64>,
}

impl<'a> SampleExport<'a> {
    /// Flatten `samples` and convert capacities to `unit`.
    pub fn new(config: &'a SimulationConfig, samples: &TrialSamples, unit: CapacityUnit) -> Self {
        SampleExport {
            config,
            capacity_unit: unit,
            sinr: samples.flattened(Metric::Sinr),
            capacity: samples
                .flattened(Metric::Capacity)
                .into_iter()
                .map(|c| unit.convert(c))
                .collect(),
        }
    }
}

/// Write samples as pretty JSON.
pub fn write_json<W: Write>(export: &SampleExport<'_>, writer: &mut W) -> Result<(), RunnerError> {
    serde_json::to_writer_pretty(&mut *writer, export)?;
    writeln!(writer)?;
    Ok(())
}

/// Write samples as `trial,metric,value` rows.
pub fn write_csv<W: Write>(samples: &TrialSamples, unit: CapacityUnit, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "trial,metric,value")?;

    for (trial, values) in samples.sinr.iter().enumerate() {
        for value in values {
            writeln!(writer, "{},sinr,{}", trial, format_float(*value))?;
        }
    }
    for (trial, values) in samples.capacity.iter().enumerate() {
        for value in values {
            writeln!(writer, "{},{},{}", trial, unit.csv_metric(), format_float(unit.convert(*value)))?;
        }
    }

    Ok(())
}

/// Format a float value for CSV output.
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellsim_model::SystemConfig;

    fn samples() -> TrialSamples {
        TrialSamples {
            sinr: vec![vec![1.0, 0.5], vec![2.0]],
            capacity: vec![vec![1e8, 5.85e7], vec![1.5e8]],
        }
    }

    #[test]
    fn test_csv_rows() {
        let mut out = Vec::new();
        write_csv(&samples(), CapacityUnit::Mbps, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "trial,metric,value");
        assert_eq!(lines.len(), 1 + 3 + 3);
        assert_eq!(lines[1], "0,sinr,1");
        assert_eq!(lines[2], "0,sinr,0.5");
        assert_eq!(lines[3], "1,sinr,2");
        assert_eq!(lines[4], "0,capacity_mbps,100");
        assert_eq!(lines[5], "0,capacity_mbps,58.5");
    }

    #[test]
    fn test_json_document() {
        let config = SimulationConfig {
            system: SystemConfig::default(),
            trials: 2,
            seed: 3,
        };
        let export = SampleExport::new(&config, &samples(), CapacityUnit::BitsPerSecond);
        let mut out = Vec::new();
        write_json(&export, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["capacity_unit"], "bps");
        assert_eq!(value["config"]["seed"], 3);
        assert_eq!(value["config"]["system"]["policy"], "round-robin");
        assert_eq!(value["sinr"].as_array().unwrap().len(), 3);
        assert_eq!(value["capacity"][2], 1.5e8);
    }
}
