use clap::Subcommand;

use crate::cli::admin_cmd::AdminCmd;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(
        about = "Administrator account commands",
        long_about = "Create administrator accounts directly in the database, bypassing the API."
    )]
    Admin {
        #[command(subcommand)]
        cmd: AdminCmd,
    },
    #[command(
        about = "Initialise the database and exit",
        long_about = "Create the data directory and the SQLite schema (honouring --reset), then exit without serving."
    )]
    Migrate,
}
