//! Haggler CLI binary

use haggler::cli::{run_check_config, run_index, run_simulate, Cli, Commands, SimulateOptions};
use haggler::control::CycleOutcome;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index { prices, config } => {
            run_index(&prices, config.as_deref())?;
        }

        Commands::CheckConfig { config } => {
            run_check_config(&config)?;
        }

        Commands::Simulate {
            config,
            prices,
            stall,
            no_window,
            funds,
        } => {
            let options = SimulateOptions {
                stall,
                no_window,
                funds,
            };
            let outcome = run_simulate(config.as_deref(), prices.as_deref(), options).await?;
            match outcome {
                Some(CycleOutcome::StartupFailed(e)) => {
                    anyhow::bail!("cycle could not start: {}", e)
                }
                Some(CycleOutcome::Aborted { step, error }) => {
                    anyhow::bail!("cycle aborted during {}: {}", step, error)
                }
                _ => {}
            }
        }
    }

    Ok(())
}
