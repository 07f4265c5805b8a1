//! Disc Deck command line front end
//!
//! Drives the persisted reference device through the editor and the
//! upload sequencer. This library exposes the pieces for testing.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod interact;
pub mod render;

pub use cli::{Cli, Command};
pub use config::CliConfig;
pub use context::AppContext;
pub use error::{CliError, Result};
pub use export::CommandExporter;
