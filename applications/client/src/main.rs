/// Chorus Client - sync a local music library with a Chorus server
use chorus_client::{ClientConfig, ClientError, SyncEngine};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chorus-client")]
#[command(about = "Chorus music library sync client", long_about = None)]
struct Cli {
    /// Username to sync as
    #[arg(short, long)]
    username: String,

    /// Server host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(long, default_value_t = 9999)]
    port: u16,

    /// Root directory for the local library copy
    #[arg(long, default_value = "./chorus-data")]
    dir: PathBuf,

    /// Protocol deadline in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chorus_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::new(cli.host, cli.port, cli.username);
    config.local_dir = cli.dir;
    config.io_timeout = Duration::from_secs(cli.timeout);

    let engine = SyncEngine::new(config);

    // The interactive editing front-end lives outside this binary; a plain
    // invocation performs a passthrough sync that re-uploads the local state.
    match engine.sync(|_library, _history| {}).await {
        Ok(report) => {
            println!(
                "Synchronized: {} songs, {} playlists ({} files down, {} files up)",
                report.library.songs.len(),
                report.library.playlists.len(),
                report.downloaded_files,
                report.uploaded_files,
            );
            Ok(())
        }
        Err(err @ ClientError::SessionRejected(_)) => {
            eprintln!("{err}");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
