//! Command-line interface module.

mod args;
pub mod lint;
pub mod render;
pub mod watch;

pub use args::{Cli, Commands, PageArgs};
