//! Shape display manager
//!
//! Library half of the `shapedisplay` binary: subcommands, terminal
//! keyboard input and logging setup.

pub mod commands;
pub mod keyboard;
pub mod logging;
