use clap::Parser;
use miette::{Context, Result};

use crate::{
    cli::{CLIArgs, CLICommand},
    context::AppContext,
};

mod cli;
mod commands;
mod configuration;
mod context;
mod logging;
mod scripts;


fn main() -> Result<()> {
    let cli_args = CLIArgs::parse();

    // Load configuration. Building it also initializes tracing.
    let context = AppContext::load(cli_args.configuration_file_path.as_deref())
        .wrap_err("Failed to load configuration file.")?;

    match cli_args.command {
        CLICommand::Shell => commands::shell::execute(context),
        CLICommand::Script(arguments) => commands::script::execute(&context, &arguments),
        CLICommand::Echo(arguments) => commands::echo::execute(&context, &arguments),
    }
}
