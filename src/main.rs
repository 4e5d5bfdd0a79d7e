use color_eyre::Result;
use flowstream::cli::{parse_args, run_tail, version_string, CliCommand, USAGE};
use flowstream::{FlowEventClient, StreamConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let options = match parse_args(std::env::args()) {
        CliCommand::Version => {
            println!("{}", version_string());
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Tail(options) => options,
    };

    // Logs go to stderr so stdout stays pure JSON lines
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = StreamConfig::from_env();
    info!(
        base_url = %config.base_url,
        flow_id = ?options.flow_id,
        "Starting flowstream"
    );

    let client = FlowEventClient::from_config(config);
    run_tail(&client, &options).await
}
