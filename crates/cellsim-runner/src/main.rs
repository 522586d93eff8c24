//! # cellsim-runner
//!
//! CLI runner for cellsim.
//!
//! This is the main entry point for Monte-Carlo runs of the cellular model
//! and for power-control studies on the reference scenarios.

use cellsim_runner::{
    run_power_control, run_trials, write_csv, write_json, CapacityUnit, ControlMethod, PowerControlRequest,
    RunnerError, SampleExport,
};

use cellsim_model::properties::{
    CHANNEL_AGGREGATION, CHANNEL_POLICY, POWER_CONTROL, PROPAGATION_FADING, PROPAGATION_SHADOWING,
    PROPAGATION_SHADOWING_SIGMA, SIMULATION_SEED, SIMULATION_TRIALS, SYSTEM_ACCESS_POINTS, SYSTEM_BANDWIDTH_HZ,
    SYSTEM_CHANNELS, SYSTEM_SIZE_M, SYSTEM_USERS,
};
use cellsim_model::{load_properties, ChannelPolicy, ModelError, PropertySetError, ResolvedProperties, SimulationConfig};
use cellsim_power::{get_scenario, GradientConfig, LinkReport, Objective, PowerLimits, ScenarioKind};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// Constants
// ============================================================================

/// Rounds of distributed power control when `--iterations` is omitted.
const DEFAULT_DPC_ITERATIONS: usize = 50;

/// Steps of gradient power control when `--iterations` is omitted.
const DEFAULT_GRADIENT_ITERATIONS: usize = 200;

// ============================================================================
// CLI Configuration
// ============================================================================

/// Output format for Monte-Carlo samples.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SampleFormat {
    /// JSON document with the run configuration and one list per metric.
    Json,
    /// CSV rows of `trial,metric,value`.
    Csv,
}

/// Output format for the link report.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable text.
    Text,
    /// JSON for programmatic consumption.
    Json,
}

/// Channel allocation policy.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PolicyArg {
    /// Shuffled per access point, leftovers to the least used channel.
    RoundRobin,
    /// Fading-aware direct mapping.
    Papoa,
    /// Interference-minimizing greedy choice.
    Imca,
    /// Uniformly random channel.
    Random,
}

impl From<PolicyArg> for ChannelPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::RoundRobin => ChannelPolicy::RoundRobin,
            PolicyArg::Papoa => ChannelPolicy::Papoa,
            PolicyArg::Imca => ChannelPolicy::Imca,
            PolicyArg::Random => ChannelPolicy::Random,
        }
    }
}

/// Reference scenario.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ScenarioArg {
    /// Two users sharing one access point.
    Default,
    /// Four 500 m cells.
    NoiseLimited,
    /// Four 50 m cells.
    InterferenceLimited,
}

impl From<ScenarioArg> for ScenarioKind {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Default => ScenarioKind::Default,
            ScenarioArg::NoiseLimited => ScenarioKind::NoiseLimited,
            ScenarioArg::InterferenceLimited => ScenarioKind::InterferenceLimited,
        }
    }
}

/// Power-control algorithm.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MethodArg {
    /// Distributed target-SINR iteration.
    Dpc,
    /// Finite-difference gradient.
    Gradient,
}

impl From<MethodArg> for ControlMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Dpc => ControlMethod::Dpc,
            MethodArg::Gradient => ControlMethod::Gradient,
        }
    }
}

/// Objective of the gradient method.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ObjectiveArg {
    /// Squared distance to the target SINR (minimized).
    Target,
    /// Smallest SINR (maximized).
    Min,
    /// Sum of SINRs (maximized).
    Sum,
    /// Smallest SINR times the sum (maximized).
    MinSum,
}

impl From<ObjectiveArg> for Objective {
    fn from(arg: ObjectiveArg) -> Self {
        match arg {
            ObjectiveArg::Target => Objective::Target,
            ObjectiveArg::Min => Objective::Min,
            ObjectiveArg::Sum => Objective::Sum,
            ObjectiveArg::MinSum => Objective::MinSum,
        }
    }
}

/// cellsim - Monte-Carlo cellular SINR and capacity simulator
#[derive(Parser, Debug)]
#[command(name = "cellsim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run Monte-Carlo trials and write the SINR and capacity samples
    Run(RunConfig),
    /// Run power control on a reference scenario and write the trajectory
    PowerControl(PowerControlConfig),
    /// Report per-user capacity and energy efficiency for given powers
    LinkReport(LinkReportConfig),
    /// List all available properties with descriptions and defaults
    Properties,
}

/// Configuration for Monte-Carlo runs
#[derive(Parser, Debug)]
pub struct RunConfig {
    /// Path(s) to YAML property files. Multiple files are merged in order (later overrides earlier).
    pub configs: Vec<PathBuf>,

    /// Number of access points (truncated to a perfect square)
    #[arg(long)]
    pub access_points: Option<usize>,

    /// Number of users
    #[arg(long)]
    pub users: Option<usize>,

    /// Number of orthogonal channels
    #[arg(long)]
    pub channels: Option<u32>,

    /// Side of the square region in metres
    #[arg(long)]
    pub size: Option<f64>,

    /// Total bandwidth in Hz
    #[arg(long)]
    pub bandwidth: Option<f64>,

    /// Channel allocation policy
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Enable log-normal shadowing
    #[arg(long)]
    pub shadowing: bool,

    /// Disable log-normal shadowing
    #[arg(long, conflicts_with = "shadowing")]
    pub no_shadowing: bool,

    /// Log-standard deviation of the shadowing
    #[arg(long)]
    pub sigma: Option<f64>,

    /// Enable Rayleigh fading
    #[arg(long)]
    pub fading: bool,

    /// Disable Rayleigh fading
    #[arg(long, conflicts_with = "fading")]
    pub no_fading: bool,

    /// Let lone users transmit on every channel
    #[arg(long)]
    pub aggregation: bool,

    /// Keep lone users on a single channel
    #[arg(long, conflicts_with = "aggregation")]
    pub no_aggregation: bool,

    /// Noise-equalizing transmit power instead of a fixed one
    #[arg(long)]
    pub power_control: bool,

    /// Fixed transmit power
    #[arg(long, conflicts_with = "power_control")]
    pub no_power_control: bool,

    /// Number of trials
    #[arg(short, long)]
    pub trials: Option<usize>,

    /// Base random seed; trial i uses seed + i
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: SampleFormat,

    /// Report capacities in Mbps instead of bit/s
    #[arg(long)]
    pub mbps: bool,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Configuration for power-control studies
#[derive(Parser, Debug)]
pub struct PowerControlConfig {
    /// Reference scenario
    #[arg(long, value_enum, default_value = "default")]
    pub scenario: ScenarioArg,

    /// Power-control algorithm
    #[arg(long, value_enum, default_value = "dpc")]
    pub method: MethodArg,

    /// Objective of the gradient method
    #[arg(long, value_enum, default_value = "target")]
    pub objective: ObjectiveArg,

    /// Target SINR (linear)
    #[arg(long, default_value = "1.0")]
    pub target_sinr: f64,

    /// Minimum transmit power in watts
    #[arg(long, default_value = "0.001")]
    pub pmin: f64,

    /// Maximum (and starting) transmit power in watts
    #[arg(long, default_value = "1.0")]
    pub pmax: f64,

    /// Number of rounds (default: 50 for dpc, 200 for gradient)
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Finite-difference step of the gradient method
    #[arg(long, default_value = "0.01")]
    pub eta: f64,

    /// Learning rate of the gradient method
    #[arg(long, default_value = "0.01")]
    pub mu: f64,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Configuration for link reports
#[derive(Parser, Debug)]
pub struct LinkReportConfig {
    /// Reference scenario
    #[arg(long, value_enum, default_value = "default")]
    pub scenario: ScenarioArg,

    /// Transmit power of every user in watts, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub power: Vec<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

// ============================================================================
// Commands
// ============================================================================

/// Open the output file, or stdout when no path is given.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, RunnerError> {
    match path {
        Some(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
        None => Ok(Box::new(std::io::stdout().lock())),
    }
}

/// `Some(true)` for `--x`, `Some(false)` for `--no-x`, `None` when neither is given.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Resolve YAML files and command line overrides into a run configuration.
fn resolve_run_config(config: &RunConfig) -> Result<SimulationConfig, RunnerError> {
    let mut props = if config.configs.is_empty() {
        ResolvedProperties::new()
    } else {
        let paths: Vec<&Path> = config.configs.iter().map(|p| p.as_path()).collect();
        load_properties(&paths)?
    };

    apply_overrides(config, &mut props).map_err(ModelError::from)?;
    Ok(SimulationConfig::from_properties(&props)?)
}

/// Apply the flags given on the command line on top of `props`.
fn apply_overrides(config: &RunConfig, props: &mut ResolvedProperties) -> Result<(), PropertySetError> {
    if let Some(v) = config.access_points {
        props.set(&SYSTEM_ACCESS_POINTS, v)?;
    }
    if let Some(v) = config.users {
        props.set(&SYSTEM_USERS, v)?;
    }
    if let Some(v) = config.channels {
        props.set(&SYSTEM_CHANNELS, v)?;
    }
    if let Some(v) = config.size {
        props.set(&SYSTEM_SIZE_M, v)?;
    }
    if let Some(v) = config.bandwidth {
        props.set(&SYSTEM_BANDWIDTH_HZ, v)?;
    }
    if let Some(policy) = config.policy {
        props.set(&CHANNEL_POLICY, ChannelPolicy::from(policy).to_string())?;
    }
    if let Some(v) = switch(config.shadowing, config.no_shadowing) {
        props.set(&PROPAGATION_SHADOWING, v)?;
    }
    if let Some(v) = config.sigma {
        props.set(&PROPAGATION_SHADOWING_SIGMA, v)?;
    }
    if let Some(v) = switch(config.fading, config.no_fading) {
        props.set(&PROPAGATION_FADING, v)?;
    }
    if let Some(v) = switch(config.aggregation, config.no_aggregation) {
        props.set(&CHANNEL_AGGREGATION, v)?;
    }
    if let Some(v) = switch(config.power_control, config.no_power_control) {
        props.set(&POWER_CONTROL, v)?;
    }
    if let Some(v) = config.trials {
        props.set(&SIMULATION_TRIALS, v)?;
    }
    if let Some(v) = config.seed {
        props.set(&SIMULATION_SEED, v)?;
    }
    Ok(())
}

fn run_command(config: RunConfig) -> Result<(), RunnerError> {
    let simulation = resolve_run_config(&config)?;
    info!(
        trials = simulation.trials,
        seed = simulation.seed,
        policy = %simulation.system.policy,
        "Starting Monte-Carlo run"
    );

    let samples = run_trials(&simulation)?;
    let unit = if config.mbps {
        CapacityUnit::Mbps
    } else {
        CapacityUnit::BitsPerSecond
    };

    let mut output = open_output(config.output.as_deref())?;
    match config.format {
        SampleFormat::Json => write_json(&SampleExport::new(&simulation, &samples, unit), &mut output)?,
        SampleFormat::Csv => write_csv(&samples, unit, &mut output)?,
    }
    output.flush()?;
    Ok(())
}

fn power_control_command(config: PowerControlConfig) -> Result<(), RunnerError> {
    let method = ControlMethod::from(config.method);
    let iterations = config.iterations.unwrap_or(match method {
        ControlMethod::Dpc => DEFAULT_DPC_ITERATIONS,
        ControlMethod::Gradient => DEFAULT_GRADIENT_ITERATIONS,
    });

    let request = PowerControlRequest {
        scenario: config.scenario.into(),
        method,
        gradient: GradientConfig {
            objective: config.objective.into(),
            target_sinr: config.target_sinr,
            limits: PowerLimits {
                pmin: config.pmin,
                pmax: config.pmax,
            },
            iterations,
            eta: config.eta,
            mu: config.mu,
        },
    };

    let report = run_power_control(&request)?;
    let mut output = open_output(config.output.as_deref())?;
    serde_json::to_writer_pretty(&mut output, &report)?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn link_report_command(config: LinkReportConfig) -> Result<(), RunnerError> {
    let scenario = get_scenario(config.scenario.into())?;
    let report = LinkReport::new(&scenario, &config.power)?;

    match config.format {
        ReportFormat::Text => println!("{}", report),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn main() -> Result<(), RunnerError> {
    // Initialize tracing subscriber with RUST_LOG env filter
    // Default to "warn" level if RUST_LOG is not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(config) => {
            run_command(config)?;
        }
        Commands::PowerControl(config) => {
            power_control_command(config)?;
        }
        Commands::LinkReport(config) => {
            link_report_command(config)?;
        }
        Commands::Properties => {
            print_properties_info();
        }
    }

    Ok(())
}

/// Print information about all available properties
fn print_properties_info() {
    use cellsim_model::properties::{known_namespaces, properties_by_namespace};

    println!("cellsim Available Properties");
    println!("============================\n");

    println!("Properties configure a Monte-Carlo run and can be set in YAML files.");
    println!("Namespaces nest in YAML; the full name joins them with '/'.\n");

    println!("## Property Resolution Order\n");
    println!("  1. Built-in code defaults (shown below)");
    println!("  2. YAML files (in order loaded)");
    println!("  3. Command line flags of `cellsim run`\n");
    println!("When loading multiple YAML files, later files override earlier ones.\n");

    for namespace in known_namespaces() {
        println!("### {}/\n", namespace);

        for prop in properties_by_namespace(namespace) {
            println!("  {}", prop.name);
            println!("    {}", prop.description);
            print!("    Default: {}", prop.default);
            if let Some(unit) = &prop.unit {
                print!(" {}", unit);
            }
            println!();
            println!();
        }
    }

    println!("## YAML Example\n");
    println!("```yaml");
    println!("system:");
    println!("  access_points: 16");
    println!("  users: 32");
    println!("  channels: 4");
    println!("channel:");
    println!("  policy: imca");
    println!("propagation:");
    println!("  shadowing: true");
    println!("  fading: true");
    println!("simulation:");
    println!("  trials: 500");
    println!("  seed: 1");
    println!("```");
}
