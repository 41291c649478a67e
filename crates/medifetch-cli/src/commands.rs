//! Top-level subcommands.

use clap::Subcommand;

/// Available commands for the medifetch binary.
#[derive(Subcommand)]
pub enum Commands {
    /// Start the download engine and its HTTP surface (the default when
    /// no subcommand is given).
    Serve,

    /// Run the Extractor directly with caller-supplied arguments,
    /// bypassing the download queue. For local debugging only.
    Sandbox {
        /// Arguments passed to the Extractor binary verbatim.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}
