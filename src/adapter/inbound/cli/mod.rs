//! CLI module graph and command dispatch.

pub mod command;
pub mod config;
pub mod diagnostic;
pub mod name;
pub mod output;
pub mod paths;
pub mod storage;
pub mod up;

use crate::domain::Uid;
use crate::error::Result;
use crate::infrastructure::config::settings::Settings;

use command::{Commands, ConfigCommand, StorageCommand};

/// Runs one parsed command.
pub async fn run(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Up(args) => up::execute(&args, settings).await,
        Commands::Config(ConfigCommand::Validate(args)) => config::execute_validate(&args.config),
        Commands::Storage(StorageCommand::Ceph(args)) => storage::execute_ceph(&args, settings).await,
        Commands::Name(command) => name::execute(&command),
    }
}

/// The given uid, or one derived from the current time.
fn uid_or_now(uid: Option<&str>) -> Result<Uid> {
    match uid {
        Some(uid) => Uid::new(uid),
        None => Ok(Uid::generate()),
    }
}
