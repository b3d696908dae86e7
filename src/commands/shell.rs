use std::io::{self, Write};

use miette::{miette, Context, IntoDiagnostic, Result};
use rustyline::{error::ReadlineError, DefaultEditor};
use tracing::{info, warn};

use super::{echo, script};
use crate::{context::AppContext, scripts::describe_scripts};


const PROMPT: &str = "scaffold> ";

const HELP: &str = "\
Commands:
  help                     Show this message.
  config                   Print the loaded configuration (secrets redacted).
  scripts                  List runnable script functions.
  run <module> [function]  Run a script function (defaults to `main`).
  reload                   Load the configuration file again.
  time                     Print the current time in the configured fixed zone.
  echo [message]...        Print a message.
  exit, quit               Leave the shell.";


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShellControl {
    Continue,
    Exit,
}


/// Interactive shell over a loaded [`AppContext`].
pub struct Shell {
    context: AppContext,
}

impl Shell {
    pub fn new(context: AppContext) -> Self {
        Self { context }
    }

    /// Executes a single shell line, writing any output to `output`.
    pub fn execute_line(&mut self, line: &str, output: &mut dyn Write) -> Result<ShellControl> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(ShellControl::Continue);
        };
        let arguments = words.map(str::to_string).collect::<Vec<_>>();

        match command {
            "exit" | "quit" => return Ok(ShellControl::Exit),
            "help" => writeln!(output, "{HELP}").into_diagnostic()?,
            "config" => {
                let configuration = self
                    .context
                    .configuration_as_toml()
                    .into_diagnostic()
                    .wrap_err("Failed to serialize configuration.")?;

                write!(output, "{configuration}").into_diagnostic()?;
            }
            "scripts" => {
                for line in describe_scripts() {
                    writeln!(output, "{line}").into_diagnostic()?;
                }
            }
            "run" => match arguments.as_slice() {
                [module] => script::run(&self.context, module, None)?,
                [module, function] => script::run(&self.context, module, Some(function.as_str()))?,
                _ => return Err(miette!("Usage: run <module> [function].")),
            },
            "reload" => {
                self.context = self
                    .context
                    .reloaded()
                    .wrap_err("Failed to reload configuration file.")?;

                writeln!(
                    output,
                    "Reloaded {}.",
                    self.context.configuration_file_path.display()
                )
                .into_diagnostic()?;
            }
            "time" => {
                let time_zone = self.context.application.time_zone();

                writeln!(
                    output,
                    "{} ({}, TZ={})",
                    time_zone.now().to_rfc3339(),
                    time_zone.fixed_zone().name(),
                    time_zone.name()
                )
                .into_diagnostic()?;
            }
            "echo" => writeln!(output, "{}", echo::render(&self.context, &arguments)).into_diagnostic()?,
            unknown => {
                return Err(miette!(
                    "Unknown command '{}'. Type `help` for a list of commands.",
                    unknown
                ))
            }
        }

        Ok(ShellControl::Continue)
    }

    /// Reads and executes lines until `exit`, `quit` or end of input.
    pub fn repl(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()
            .into_diagnostic()
            .wrap_err("Failed to initialize line editor.")?;

        println!(
            "{} shell, type `help` for a list of commands.",
            self.context.application.name()
        );

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        editor.add_history_entry(line.as_str()).into_diagnostic()?;
                    }

                    let mut stdout = io::stdout().lock();
                    match self.execute_line(&line, &mut stdout) {
                        Ok(ShellControl::Continue) => {}
                        Ok(ShellControl::Exit) => break,
                        Err(error) => {
                            warn!("Shell command failed.");
                            eprintln!("{error:?}");
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(error) => {
                    return Err(error)
                        .into_diagnostic()
                        .wrap_err("Failed to read shell input.")
                }
            }
        }

        info!("Shell closed.");
        Ok(())
    }
}


pub fn execute(context: AppContext) -> Result<()> {
    Shell::new(context).repl()
}
