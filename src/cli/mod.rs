mod admin_cmd;
mod args;
mod command;

pub use admin_cmd::AdminCmd;
pub use args::Cli;
pub use command::Command;

pub use args::parse;
