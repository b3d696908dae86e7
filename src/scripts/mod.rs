//! Functions runnable with the `script` command (and the shell's `run`).
//!
//! Scripts are grouped into modules named with a `script.` prefix. Every
//! module is listed in [`MODULES`]; a function is either plain or async.

use std::{future::Future, pin::Pin};

use miette::Result;

use crate::context::AppContext;

mod config;
mod example;


pub type ScriptFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a>>;

#[derive(Clone, Copy, Debug)]
pub enum ScriptFunction {
    Sync(fn(&AppContext) -> Result<()>),
    Async(for<'a> fn(&'a AppContext) -> ScriptFuture<'a>),
}

impl ScriptFunction {
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}


#[derive(Clone, Copy, Debug)]
pub struct ScriptEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub function: ScriptFunction,
}


#[derive(Debug)]
pub struct ScriptModule {
    pub name: &'static str,
    pub entries: &'static [ScriptEntry],
}

impl ScriptModule {
    pub fn entry(&self, function_name: &str) -> Option<&ScriptEntry> {
        self.entries.iter().find(|entry| entry.name == function_name)
    }

    /// Function names, sorted.
    pub fn function_names(&self) -> Vec<&'static str> {
        let mut names = self.entries.iter().map(|entry| entry.name).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}


pub static MODULES: &[ScriptModule] = &[
    ScriptModule {
        name: "script",
        entries: &[ScriptEntry {
            name: "main",
            description: "List every script module and its functions.",
            function: ScriptFunction::Sync(list_scripts),
        }],
    },
    ScriptModule {
        name: "script.config",
        entries: config::ENTRIES,
    },
    ScriptModule {
        name: "script.example",
        entries: example::ENTRIES,
    },
];


pub fn find_module(module_name: &str) -> Option<&'static ScriptModule> {
    MODULES.iter().find(|module| module.name == module_name)
}

/// Module names, sorted.
pub fn module_names() -> Vec<&'static str> {
    let mut names = MODULES.iter().map(|module| module.name).collect::<Vec<_>>();
    names.sort_unstable();
    names
}


/// One line per function, e.g. `script.example clock (async): Print the current time.`
pub fn describe_scripts() -> Vec<String> {
    MODULES
        .iter()
        .flat_map(|module| {
            module.entries.iter().map(move |entry| {
                format!(
                    "{} {}{}: {}",
                    module.name,
                    entry.name,
                    if entry.function.is_async() { " (async)" } else { "" },
                    entry.description
                )
            })
        })
        .collect()
}

fn list_scripts(_context: &AppContext) -> Result<()> {
    for line in describe_scripts() {
        println!("{line}");
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_names_are_unique_and_prefixed() {
        let names = module_names();

        let mut deduplicated = names.clone();
        deduplicated.dedup();
        assert_eq!(names, deduplicated);

        assert!(names
            .iter()
            .all(|name| *name == "script" || name.starts_with("script.")));
    }

    #[test]
    fn every_module_has_a_main_function() {
        for module in MODULES {
            assert!(module.entry("main").is_some(), "{} has no main", module.name);
        }
    }

    #[test]
    fn descriptions_mark_async_functions() {
        let lines = describe_scripts();

        assert!(lines.iter().any(|line| line.starts_with("script.example clock (async): ")));
        assert!(lines.iter().any(|line| line.starts_with("script main: ")));
    }
}
