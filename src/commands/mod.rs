use crate::cli::Command;
use crate::context;

pub mod admin;

pub trait CommandRunner {
    fn run(&self, ctx: &context::Context) -> anyhow::Result<()>;
}

impl Command {
    pub fn run(&self, ctx: &context::Context) -> anyhow::Result<()> {
        match self {
            Command::Admin { cmd } => cmd.run(ctx),
            Command::Migrate => {
                log::info!("✅ Database ready at {}", ctx.storage.path);
                Ok(())
            }
        }
    }
}
