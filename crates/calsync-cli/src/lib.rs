//! Config loading, command dispatch and output rendering for `calsync`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod dates;
pub mod error;
pub mod output;
pub mod secret;

pub use cli::Cli;
pub use config::Config;
pub use error::{CliError, CliResult};
