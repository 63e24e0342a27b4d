//! Handler for the `config` command group.

use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::domain::EnvironmentConfig;
use crate::error::Result;
use crate::infrastructure::bootstrap;

/// Execute `config validate`.
///
/// Loads the document exactly as `up` would, so anything accepted here
/// reaches the container engine.
pub fn execute_validate(path: &Path) -> Result<()> {
    let role = bootstrap::build_role();
    let env = EnvironmentConfig::load(path, role.document_keys())?;

    output::section("Environment");
    output::success("Environment document is valid");
    output::field("Path", path.display());
    output::field("Input dir", &env.input_dir);

    output::section("Instances");
    for instance in &env.instances {
        let mut refs = instance.db_refs();
        refs.sort();
        refs.dedup();
        output::field(
            &instance.name,
            format!(
                "{} node(s), db_driver {}, {} database node(s)",
                instance.nodes.len(),
                instance.db_driver,
                refs.len()
            ),
        );
        for node in &instance.nodes {
            output::note(&format!("- {}", node.name));
        }
    }
    Ok(())
}
