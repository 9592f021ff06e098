pub mod commands;
pub mod handlers;
pub mod spinner;

pub use commands::{CliArgs, Commands, GetArgs, ListArgs, ProbeArgs, RunArgs, SchemaArg, SearchArgs};
pub use spinner::{spinner_bar, SpinnerHandler, SpinnerLogWriter};
