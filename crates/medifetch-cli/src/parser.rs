//! Root CLI parser.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface definition for the media download engine.
#[derive(Parser)]
#[command(name = "medifetch")]
#[command(about = "Run the medifetch download engine")]
#[command(version)]
pub struct Cli {
    /// Override the `SQLite` database path for this invocation.
    #[arg(long = "database-path", global = true)]
    pub database_path: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_no_subcommand() {
        let cli = Cli::parse_from(["medifetch"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn sandbox_collects_trailing_args() {
        let cli = Cli::parse_from(["medifetch", "sandbox", "--", "--dump-json", "url"]);
        match cli.command {
            Some(Commands::Sandbox { args }) => {
                assert_eq!(args, vec!["--dump-json".to_string(), "url".to_string()]);
            }
            _ => panic!("expected Sandbox command"),
        }
    }
}
