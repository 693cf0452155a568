use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::chart::ChartOptions;
use crate::core::{EngineConfig, MAX_SUPPORTED_YEARS};
use crate::error::ConfigError;

const CHART_DIMENSION_RANGE: RangeInclusive<u32> = 200..=4000;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compound interest projection server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the calculator pages and the JSON projection API
    Serve(ServeArgs),
    /// Print a single projection as JSON
    Project(ProjectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(long, default_value_t = 100, help = "Longest accepted term in years")]
    pub max_years: u32,
    #[arg(long, default_value_t = 900, help = "Chart width in pixels")]
    pub chart_width: u32,
    #[arg(long, default_value_t = 450, help = "Chart height in pixels")]
    pub chart_height: u32,
    #[arg(short, long, help = "Log at debug level unless RUST_LOG is set")]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, help = "Initial lump sum")]
    pub principal: f64,
    #[arg(long, default_value_t = 0.0, help = "Contribution added at the end of each month")]
    pub monthly: f64,
    #[arg(long, allow_negative_numbers = true, help = "Nominal annual rate in percent")]
    pub rate: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub years: i64,
    #[arg(long, default_value_t = 100, help = "Longest accepted term in years")]
    pub max_years: u32,
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub engine: EngineConfig,
    pub chart: ChartOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            engine: EngineConfig::default(),
            chart: ChartOptions::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_args(args: &ServeArgs) -> Result<Self, ConfigError> {
        let config = Self {
            host: args.host,
            port: args.port,
            engine: EngineConfig {
                max_years: args.max_years,
            },
            chart: ChartOptions {
                width: args.chart_width,
                height: args.chart_height,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("--port must be > 0".to_string()));
        }
        validate_max_years(self.engine.max_years)?;
        if !CHART_DIMENSION_RANGE.contains(&self.chart.width) {
            return Err(ConfigError::Invalid(format!(
                "--chart-width must be between {} and {}",
                CHART_DIMENSION_RANGE.start(),
                CHART_DIMENSION_RANGE.end()
            )));
        }
        if !CHART_DIMENSION_RANGE.contains(&self.chart.height) {
            return Err(ConfigError::Invalid(format!(
                "--chart-height must be between {} and {}",
                CHART_DIMENSION_RANGE.start(),
                CHART_DIMENSION_RANGE.end()
            )));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

pub fn validate_max_years(max_years: u32) -> Result<(), ConfigError> {
    if !(1..=MAX_SUPPORTED_YEARS).contains(&max_years) {
        return Err(ConfigError::Invalid(format!(
            "--max-years must be between 1 and {MAX_SUPPORTED_YEARS}"
        )));
    }
    Ok(())
}

/// Installs the global stderr subscriber. `RUST_LOG` takes precedence over
/// the verbosity flag.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
