use miette::{Context, Diagnostic, Result};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    cli::ScriptArgs,
    context::AppContext,
    scripts::{find_module, module_names, ScriptEntry, ScriptFunction, ScriptModule},
};


pub const SCRIPT_MODULE_PREFIX: &str = "script";

pub const DEFAULT_FUNCTION_NAME: &str = "main";


#[derive(Debug, Error, Diagnostic)]
pub enum ScriptError {
    #[error("Script module '{module}' not found. Available: {}.", list_or_none(.available))]
    #[diagnostic(
        code(scaffold::script::module_not_found),
        help("Modules are given without the `script.` prefix, e.g. `-m example`.")
    )]
    ModuleNotFound {
        module: String,
        available: Vec<String>,
    },

    #[error("Function '{function}' not found in '{module}'. Available: {}.", list_or_none(.available))]
    #[diagnostic(code(scaffold::script::function_not_found))]
    FunctionNotFound {
        module: String,
        function: String,
        available: Vec<String>,
    },

    #[error("Async scripts cannot run inside an active tokio runtime.")]
    #[diagnostic(code(scaffold::script::nested_runtime))]
    NestedRuntime,

    #[error("Failed to build the tokio runtime for an async script.")]
    #[diagnostic(code(scaffold::script::runtime_init))]
    RuntimeInit(#[source] std::io::Error),
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "<none>".to_string()
    } else {
        names.join(", ")
    }
}


/// Prefixes `module` with `script.`, unless it already is `script` or starts with `script.`.
pub fn normalize_module_name(module: &str) -> String {
    if module == SCRIPT_MODULE_PREFIX || module.starts_with("script.") {
        module.to_string()
    } else {
        format!("{SCRIPT_MODULE_PREFIX}.{module}")
    }
}


/// Looks up a script function. `module` is normalized first and `function`
/// defaults to `main`.
pub fn resolve(
    module: &str,
    function: Option<&str>,
) -> Result<(&'static ScriptModule, &'static ScriptEntry), ScriptError> {
    let module = normalize_module_name(module);
    let function = function.unwrap_or(DEFAULT_FUNCTION_NAME);

    let script_module = find_module(&module).ok_or_else(|| ScriptError::ModuleNotFound {
        available: module_names().into_iter().map(str::to_string).collect(),
        module: module.clone(),
    })?;

    let entry = script_module
        .entry(function)
        .ok_or_else(|| ScriptError::FunctionNotFound {
            module: module.clone(),
            function: function.to_string(),
            available: script_module
                .function_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })?;

    Ok((script_module, entry))
}


/// Runs a script function to completion.
///
/// Async functions get their own current-thread runtime, which is why they
/// can't be run from code that is itself driven by a runtime.
pub fn run_function(context: &AppContext, function: ScriptFunction) -> Result<()> {
    match function {
        ScriptFunction::Sync(function) => function(context),
        ScriptFunction::Async(function) => {
            if tokio::runtime::Handle::try_current().is_ok() {
                return Err(ScriptError::NestedRuntime.into());
            }

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(ScriptError::RuntimeInit)?;

            runtime.block_on(function(context))
        }
    }
}


/// Resolves and runs a script function.
pub fn run(context: &AppContext, module: &str, function: Option<&str>) -> Result<()> {
    let (script_module, entry) = resolve(module, function)?;

    debug!(
        module = script_module.name,
        function = entry.name,
        is_async = entry.function.is_async(),
        "Running script."
    );

    run_function(context, entry.function).wrap_err_with(|| {
        format!(
            "Script function '{}' in '{}' failed.",
            entry.name, script_module.name
        )
    })?;

    info!(module = script_module.name, function = entry.name, "Script finished.");
    Ok(())
}


pub fn execute(context: &AppContext, arguments: &ScriptArgs) -> Result<()> {
    run(context, &arguments.module, arguments.function_name.as_deref())
}


#[cfg(test)]
mod tests {
    use miette::miette;

    use super::*;
    use crate::{context::test_support::test_context, scripts::ScriptFuture};

    #[test]
    fn normalizes_module_names() {
        assert_eq!(normalize_module_name("example"), "script.example");
        assert_eq!(normalize_module_name("script"), "script");
        assert_eq!(normalize_module_name("script.example"), "script.example");
        assert_eq!(normalize_module_name("scripts"), "script.scripts");
        assert_eq!(normalize_module_name("nested.module"), "script.nested.module");
    }

    #[test]
    fn resolves_main_by_default() {
        let (module, entry) = resolve("example", None).unwrap();

        assert_eq!(module.name, "script.example");
        assert_eq!(entry.name, DEFAULT_FUNCTION_NAME);

        let (_, entry) = resolve("script.example", Some("clock")).unwrap();
        assert!(entry.function.is_async());
    }

    #[test]
    fn unknown_function_lists_available_functions() {
        let error = resolve("example", Some("missing")).unwrap_err();

        match &error {
            ScriptError::FunctionNotFound {
                module,
                function,
                available,
            } => {
                assert_eq!(module, "script.example");
                assert_eq!(function, "missing");
                assert_eq!(available, &vec!["clock".to_string(), "main".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(
            error.to_string(),
            "Function 'missing' not found in 'script.example'. Available: clock, main."
        );
    }

    #[test]
    fn unknown_module_lists_available_modules() {
        let error = resolve("nope", None).unwrap_err();

        assert!(matches!(
            error,
            ScriptError::ModuleNotFound { ref module, ref available }
                if module == "script.nope" && available.contains(&"script.example".to_string())
        ));
    }

    #[test]
    fn runs_sync_and_async_functions() {
        let (_directory, context) = test_context();

        run(&context, "config", Some("path")).unwrap();
        run(&context, "example", Some("clock")).unwrap();
    }

    #[test]
    fn script_failures_are_propagated() {
        fn failing(_context: &AppContext) -> Result<()> {
            Err(miette!("boom"))
        }

        let (_directory, context) = test_context();

        let error = run_function(&context, ScriptFunction::Sync(failing)).unwrap_err();
        assert_eq!(error.to_string(), "boom");
    }

    #[tokio::test]
    async fn async_functions_refuse_to_nest_runtimes() {
        fn noop(_context: &AppContext) -> ScriptFuture<'_> {
            Box::pin(async { Ok(()) })
        }

        let (_directory, context) = test_context();

        let error = run_function(&context, ScriptFunction::Async(noop)).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ScriptError>(),
            Some(ScriptError::NestedRuntime)
        ));
    }
}
