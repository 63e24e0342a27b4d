//! Handler for the `name` command group.

use super::command::NameCommand;
use super::output;
use crate::domain::naming::{self, Uid};
use crate::error::Result;

/// Execute `name hostname` / `name node`.
pub fn execute(command: &NameCommand) -> Result<()> {
    let name = match command {
        NameCommand::Hostname(args) => {
            let uid = Uid::new(args.uid.as_str())?;
            naming::format_hostname(&args.parts, &uid)?
        }
        NameCommand::Node { role, name } => {
            naming::validate_name(role)?;
            let uid = Uid::new(name.uid.as_str())?;
            let hostname = naming::format_hostname(&name.parts, &uid)?;
            naming::format_node_name(role, &hostname)
        }
    };
    output::value(&name);
    Ok(())
}
