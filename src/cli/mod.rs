pub mod commands;
pub mod handlers;

pub use commands::{BuildArgs, CliArgs, Commands, DeployArgs, OutputFormatArg};
pub use handlers::{handle_build, handle_deploy};
