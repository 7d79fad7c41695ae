//! CLI commands

mod completions;
mod history;
mod init;
mod projects;
mod properties;
mod run;
mod tasks;

pub use completions::CompletionsCommand;
pub use history::HistoryCommand;
pub use init::InitCommand;
pub use projects::ProjectsCommand;
pub use properties::PropertiesCommand;
pub use run::{RunCommand, TasksFailed};
pub use tasks::TasksCommand;
