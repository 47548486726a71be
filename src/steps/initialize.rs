use anyhow::{Context, Result};
use tracing::debug;

use super::StepContext;
use crate::core::instance::{Installation, Instance, InstanceOptions};

pub async fn initialize_instance(
    ctx: StepContext<'_>,
    installation: &Installation,
) -> Result<Instance> {
    let progress = ctx
        .reporter
        .progress("initializing jsreport instance in project");

    let instance = Instance::initialize(
        installation,
        &ctx.settings.store_path,
        InstanceOptions::for_migration(),
    )
    .await
    .context("An error has occurred when trying to initialize jsreport")
    .inspect_err(|_| progress.fail(None))?;

    debug!(
        capabilities = ?instance.capabilities(),
        options = ?instance.options(),
        "instance ready for migration"
    );
    progress.succeed("jsreport instance initialized");
    Ok(instance)
}
