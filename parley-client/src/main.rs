//! parley - terminal chat client
//!
//! Entry point: parses arguments, sets up logging and runs the session
//! until the user quits.

use parley_client::cli::Args;
use parley_client::config::ClientConfig;
use parley_client::ui::{ConsolePresenter, ThemeStore};
use parley_client::App;
use parley_utils::{init_logging_with_config, preferences_file, LogConfig, Result};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command-line arguments first (before logging setup)
    let args = Args::parse_args();

    // Log to a file by default, the console belongs to the conversation
    let log_config = if args.debug {
        LogConfig::development()
    } else {
        LogConfig::client()
    };
    init_logging_with_config(log_config)?;
    tracing::info!("parley starting");
    tracing::debug!("CLI args: {:?}", args);

    match run_app(args).await {
        Ok(()) => {
            tracing::info!("parley exiting normally");
            Ok(())
        }
        Err(e) => {
            tracing::error!("parley error: {}", e);
            eprintln!("Error: {}", e);
            Err(e)
        }
    }
}

async fn run_app(args: Args) -> Result<()> {
    let mut config = match args.config.as_deref() {
        Some(path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    };
    config.apply_overrides(args.url, args.upload_url);

    let themes = ThemeStore::load(preferences_file());
    let presenter = ConsolePresenter::new(std::io::stdout(), themes.theme());

    let mut app = App::new(&config, presenter, themes)?;
    app.run().await
}
