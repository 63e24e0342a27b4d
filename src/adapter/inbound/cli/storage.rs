//! Handler for the `storage` command group.

use super::command::CephArgs;
use super::{output, uid_or_now};
use crate::application::storage::{CephStorage, Pool};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Settings;

/// Execute `storage ceph`.
pub async fn execute_ceph(args: &CephArgs, settings: &Settings) -> Result<()> {
    let uid = uid_or_now(args.uid.as_deref())?;
    let image = args
        .image
        .clone()
        .unwrap_or_else(|| settings.images.ceph.clone());
    let pools: Vec<Pool> = args
        .pools
        .iter()
        .map(|(name, pg_num)| Pool::new(name.clone(), *pg_num))
        .collect();

    let engine = bootstrap::build_engine(settings);
    let document = CephStorage::new(engine.as_ref(), settings.timeouts.ceph_poller())
        .up(&image, &pools, &args.name, &uid)
        .await?;
    output::document(&document.into_value())
}
