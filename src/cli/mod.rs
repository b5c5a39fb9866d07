pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{AnalyzeArgs, CliArgs, Commands, ConfigArgs, FixArgs, TreeArgs};
pub use output::{OutputFormat, OutputFormatter, RunReport};
