use std::time::Duration;

use miette::Result;
use tracing::info;

use super::{ScriptEntry, ScriptFunction, ScriptFuture};
use crate::context::AppContext;


pub(super) const ENTRIES: &[ScriptEntry] = &[
    ScriptEntry {
        name: "main",
        description: "Greet from the configured application.",
        function: ScriptFunction::Sync(main),
    },
    ScriptEntry {
        name: "clock",
        description: "Print the current time in the configured fixed zone.",
        function: ScriptFunction::Async(clock),
    },
];


fn main(context: &AppContext) -> Result<()> {
    let application = &context.application;

    println!(
        "Hello from {} (mode: {}).",
        application.name(),
        application.mode().as_str()
    );

    Ok(())
}

fn clock(context: &AppContext) -> ScriptFuture<'_> {
    Box::pin(async move {
        let time_zone = context.application.time_zone();

        // Yield once so the function actually runs on the runtime.
        tokio::time::sleep(Duration::from_millis(1)).await;

        let now = time_zone.now();
        info!(fixed_zone = time_zone.fixed_zone().name(), "Read the clock.");
        println!("{} ({})", now.to_rfc3339(), time_zone.fixed_zone().name());

        Ok(())
    })
}
