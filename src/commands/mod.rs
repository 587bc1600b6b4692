mod ai_cmd;
mod compose;
mod config_cmd;
mod content;
mod sections;

pub use ai_cmd::AiCommand;
pub use compose::ComposeCommand;
pub use config_cmd::{ConfigCommand, OutputFormat};
pub use content::ContentCommand;
pub use sections::SectionsCommand;
