use anyhow::{Context, Result};
use clap::Parser;

use compound::config::{Cli, Command, ProjectArgs, ServerConfig, init_tracing, validate_max_years};
use compound::core::{Engine, EngineConfig, ProjectionInput};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Serve(args) => {
            init_tracing(args.verbose);
            match ServerConfig::from_args(&args) {
                Ok(config) => compound::api::run_http_server(config)
                    .await
                    .context("server error"),
                Err(e) => Err(e.into()),
            }
        }
        Command::Project(args) => {
            init_tracing(args.verbose);
            print_projection(&args)
        }
    };

    if let Err(e) = outcome {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn print_projection(args: &ProjectArgs) -> Result<()> {
    validate_max_years(args.max_years)?;
    let engine = Engine::new(EngineConfig {
        max_years: args.max_years,
    });
    // Out-of-range terms map to values ProjectionInput rejects.
    let years = u32::try_from(args.years.max(0)).unwrap_or(u32::MAX);
    let input = ProjectionInput::new(args.principal, args.monthly, args.rate, years)?;
    let report = engine.report(&input)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
