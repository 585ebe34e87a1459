//! Simon Says Service Library Crate
//!
//! Configuration loading, robot address resolution and Ctrl+C handling for
//! the `simon` binary, which is a thin wrapper that wires these to the game
//! core and the robot client.

pub mod address;
pub mod config;
pub mod interrupt;
