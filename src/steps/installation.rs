use anyhow::Result;

use super::StepContext;
use crate::core::instance::Installation;

pub async fn check_installation(ctx: StepContext<'_>) -> Result<Installation> {
    ctx.reporter.info(&format!(
        "checking jsreport installation at: {}",
        ctx.project_dir.display()
    ));

    let progress = ctx.reporter.progress("verifying jsreport installation");
    let installation = Installation::check(ctx.project_dir, &ctx.settings.required_version)
        .await
        .inspect_err(|_| progress.fail(None))?;

    progress.succeed(&format!(
        "jsreport installation is ok. version found: {}",
        installation.version
    ));
    Ok(installation)
}
