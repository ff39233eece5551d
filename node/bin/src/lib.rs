//! Operations file and command-line surface of `pectra-cli`.

pub mod cli;
pub mod config;
