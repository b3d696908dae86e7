use miette::Result;

use crate::{cli::EchoArgs, context::AppContext};


/// The message joined by spaces, or the application's name and mode if
/// there is no message.
pub fn render(context: &AppContext, message: &[String]) -> String {
    if message.is_empty() {
        let application = &context.application;
        format!("{} ({})", application.name(), application.mode().as_str())
    } else {
        message.join(" ")
    }
}


pub fn execute(context: &AppContext, arguments: &EchoArgs) -> Result<()> {
    println!("{}", render(context, &arguments.message));
    Ok(())
}
