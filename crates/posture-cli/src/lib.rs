//! # posture-cli
//!
//! Command-line front end for the posturescan libraries.
//!
//! ## Features
//!
//! - **privesc**: unquoted service paths, modifiable service binaries and
//!   AlwaysInstallElevated, against the live system or an exported snapshot
//! - **lateral**: ping-gated remote-management, file-share and RPC
//!   reachability across a host list, concurrently, interruptible with Ctrl-C
//! - **Reports**: every run is saved to a timestamped results directory
//!   as CSV plus a JSON summary
//! - **Multiple output formats**: Pretty tables, JSON, CSV, YAML

pub mod cli;
pub mod config;
pub mod hosts;
pub mod logging;
pub mod output;
pub mod report;

pub use cli::run;
