use serde_json::Value;

use crate::command::Cli;

pub enum CommandOutput {
    Plain(String),
    Object(Value),
}
pub type CommandResult = color_eyre::eyre::Result<CommandOutput>;

impl From<&str> for CommandOutput {
    fn from(text: &str) -> Self {
        CommandOutput::Plain(text.to_owned())
    }
}
impl From<String> for CommandOutput {
    fn from(text: String) -> Self {
        CommandOutput::Plain(text)
    }
}
impl From<Value> for CommandOutput {
    fn from(value: Value) -> Self {
        CommandOutput::Object(value)
    }
}

pub struct RenderConfig {
    pub quiet: bool,
}

impl RenderConfig {
    pub fn new(cli: &Cli) -> Self {
        Self { quiet: cli.quiet }
    }

    pub fn render_result(&self, result: CommandResult) -> color_eyre::eyre::Result<()> {
        match result {
            // Errors will be passed through to the caller, and rendered by the main function
            Err(e) => Err(e),

            Ok(_) if self.quiet => Ok(()),

            Ok(CommandOutput::Plain(text)) => {
                println!("{}", text);
                Ok(())
            }

            Ok(CommandOutput::Object(value)) => {
                println!("{}", serde_json::to_string_pretty(&value)?);
                Ok(())
            }
        }
    }
}
