//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};



/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "scaffold",
    author,
    about = "Application scaffold with a typed TOML configuration.",
    version
)]
pub struct CLIArgs {
    /// This is the path to the configuration file to use.
    /// If unspecified, the `CONFIG_FILE_PATH` environment variable is used,
    /// falling back to `./config.toml`.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        help = "Path to the configuration file to use. \
                [Env: CONFIG_FILE_PATH] [Default: ./config.toml]"
    )]
    pub configuration_file_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CLICommand,
}


#[derive(Subcommand, Debug)]
pub enum CLICommand {
    /// Start an interactive shell over the loaded configuration.
    Shell,

    /// Run a function from a module under `script`. Supports both sync and async functions.
    Script(ScriptArgs),

    /// Print a message (or the application's name and mode).
    Echo(EchoArgs),
}


#[derive(Args, Debug)]
pub struct ScriptArgs {
    #[arg(
        short = 'm',
        long = "module",
        help = "Module path under script, e.g. `example` or `script.example`."
    )]
    pub module: String,

    #[arg(
        value_name = "FUNCTION_NAME",
        help = "Function to run. Defaults to `main`."
    )]
    pub function_name: Option<String>,
}


#[derive(Args, Debug)]
pub struct EchoArgs {
    #[arg(value_name = "MESSAGE")]
    pub message: Vec<String>,
}
