use miette::{Context, IntoDiagnostic, Result};

use super::{ScriptEntry, ScriptFunction};
use crate::context::AppContext;


pub(super) const ENTRIES: &[ScriptEntry] = &[
    ScriptEntry {
        name: "main",
        description: "Print the loaded configuration (secrets redacted).",
        function: ScriptFunction::Sync(main),
    },
    ScriptEntry {
        name: "path",
        description: "Print the path of the loaded configuration file.",
        function: ScriptFunction::Sync(path),
    },
];


fn main(context: &AppContext) -> Result<()> {
    let configuration = context
        .configuration_as_toml()
        .into_diagnostic()
        .wrap_err("Failed to serialize configuration.")?;

    print!("{configuration}");
    Ok(())
}

fn path(context: &AppContext) -> Result<()> {
    println!("{}", context.configuration_file_path.display());
    Ok(())
}
