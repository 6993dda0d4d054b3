//! Command-line driver for the lrmatch compiler.

pub mod cli;
pub mod driver;
