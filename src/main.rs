use clap::Parser;
use exchange::config::Settings;
use exchange::infrastructure::dispatch::drain;
use exchange::interfaces::csv::command_reader::CommandReader;
use exchange::interfaces::csv::order_writer::OrderWriter;
use exchange::scenario::Scenario;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario CSV file of negotiation commands
    input: PathBuf,

    #[command(flatten)]
    settings: Settings,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let (mut scenario, mut jobs) = Scenario::new(cli.settings).into_diagnostic()?;

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for command_result in reader.commands() {
        match command_result {
            Ok(command) => {
                if let Err(e) = scenario.apply(command).await {
                    eprintln!("Error processing command: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading command: {}", e);
            }
        }
    }

    for dispatch in drain(&mut jobs) {
        info!(job = dispatch.job.name(), run_at = ?dispatch.run_at, "queued job");
    }

    let rows = scenario.rows().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = OrderWriter::new(stdout.lock());
    writer.write_orders(rows).into_diagnostic()?;

    Ok(())
}
