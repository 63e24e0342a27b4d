//! Handler for `clusterup up`.

use tracing::info;

use super::command::UpArgs;
use super::{output, paths, uid_or_now};
use crate::application::BringUpOptions;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Settings;
use crate::port::outbound::dns::DnsRequest;

/// Execute `up`: bring up the environment and print its output document.
pub async fn execute(args: &UpArgs, settings: &Settings) -> Result<()> {
    let dns: DnsRequest = args.dns.parse()?;
    let uid = uid_or_now(args.uid.as_deref())?;
    let bindir = paths::absolute(&args.bin)?;
    let logdir = args
        .logdir
        .as_deref()
        .map(paths::absolute)
        .transpose()?;

    let orchestrator = bootstrap::build_orchestrator(settings, bootstrap::build_engine(settings))?;
    let opts = BringUpOptions {
        image: args.image.clone(),
        bindir,
        logdir,
        dns,
        uid,
    };
    info!(config = %args.config.display(), image = %opts.image, uid = %opts.uid, "Bringing up environment");

    let document = orchestrator.up_from_path(&args.config, &opts).await?;
    output::document(&document.into_value())
}
