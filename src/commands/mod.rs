//! Implementations of the CLI subcommands.

pub mod echo;
pub mod script;
pub mod shell;
