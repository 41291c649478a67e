#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::{bootstrap, AppContext};
pub use commands::Commands;
pub use config::RuntimeConfig;
pub use error::CliError;
pub use parser::Cli;
