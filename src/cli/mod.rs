//! Command-line interface module.

mod args;
pub mod convert;
pub mod doctor;

pub use args::{Cli, Commands};
