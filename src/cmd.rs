mod args;
mod command;
mod subcommand;

pub use self::args::RolloutArgs;
pub use self::command::*;
pub use self::subcommand::*;
