//! Command-line interface definitions for aot-sim.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use logging::LogArgs;

/// Command-line interface for the `aot-sim` binary.
#[derive(Parser, Debug)]
#[command(
    name = "aot-sim",
    about = "Drive the always-on-top controllers through scripted scenarios",
    version
)]
pub struct Cli {
    /// Logging controls.
    #[command(flatten)]
    pub log: LogArgs,

    /// Optional RON configuration for both controllers.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Persist positions to this JSON file instead of memory.
    #[arg(long, value_name = "PATH", global = true)]
    pub store: Option<PathBuf>,

    /// Print forwarded log records tagged with their side.
    #[arg(long, global = true)]
    pub forward_logs: bool,

    /// What to do.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one scenario, or all of them.
    Run {
        /// Scenario to run.
        #[arg(value_enum, default_value_t = ScenarioName::All)]
        scenario: ScenarioName,
    },
    /// List the scenarios.
    List,
}

/// Named scenarios.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioName {
    /// Blur after join opens the window with the session token.
    OpenOnBlur,
    /// A stored off-screen position is clamped on Windows.
    ClampStored,
    /// Drag moves the window in one bounds call, keeping its size.
    Drag,
    /// Leaving while intersecting closes and persists once.
    LeaveIntersecting,
    /// Every scenario in order.
    All,
}
