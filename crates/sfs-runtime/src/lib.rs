//! # Students-for-Students Runtime
//!
//! Wiring and command surface for the client core.
//!
//! ## Modular Structure
//!
//! - `config` - `AppConfig`: every subsystem's settings, env then flags
//! - `container` - Services, event bus, notice board, metrics observer
//! - `recorder` - Bus events to Prometheus samples
//! - `demo` - Seed data for offline runs
//! - `cli` / `commands` - The `sfs` binary's arguments and their execution
//!
//! ## Startup Sequence
//!
//! 1. Parse flags and read the environment
//! 2. Install logging and register metrics
//! 3. Validate (a hosted run needs URL and anon key)
//! 4. Build the container (hosted or offline)
//! 5. Sign in the configured user and load their membership sets
//! 6. Run the command, then report notices (and metrics if asked)

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod cli;
pub mod commands;
pub mod config;
pub mod container;
pub mod demo;
pub mod recorder;

pub use cli::{Cli, Command, ToggleKind};
pub use commands::{execute, run_command, RunOutput};
pub use config::{AppConfig, ConfigError};
pub use container::{Container, HostedContainer, OfflineContainer};
pub use recorder::MetricsRecorder;
