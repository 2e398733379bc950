use clap::{Parser, Subcommand};
use jobboard_server::app::{App, RunMode};
use jobboard_server::config::AppConfig;
use jobboard_server::network::shutdown_signal;
use jobboard_server::telemetry::init_tracing;

/// Job listing service.
#[derive(Debug, Parser)]
#[command(name = "jobboard", version, about)]
struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the job RPC endpoints and the job-creation consumer (default).
    Serve,
    /// Run a single event consumer by name.
    Consumer {
        /// Consumer to run, e.g. `job_create_consumer`.
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.config)?;

    let mode = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => RunMode::Server,
        Command::Consumer { name } => RunMode::Consumer(name),
    };

    let app = App::new(cli.config).await?;
    app.run(mode, shutdown_signal()).await
}
