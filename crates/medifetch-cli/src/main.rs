//! medifetch entry point - the composition root.
//!
//! All infrastructure wiring happens in [`medifetch_cli::bootstrap`].
//! This function only parses arguments and dispatches to a handler.

use clap::Parser;

use medifetch_cli::{bootstrap, handlers, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = medifetch_cli::config::load();
    if let Some(database_path) = cli.database_path {
        config.database_path = database_path.into();
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let ctx = bootstrap(config).await?;
            handlers::serve::execute(ctx).await?;
        }
        Commands::Sandbox { args } => {
            handlers::sandbox::execute(&config.extractor_bin, &args).await?;
        }
    }

    Ok(())
}
