use anyhow::Result;
use tracing::info;

use super::{Dependency, StepContext};
use crate::core::installer::{PackageInstaller, manual_install_command};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    /// Operator declined. `command` installs everything by hand.
    Deferred { command: String },
}

fn with_extras(extras: &[Dependency]) -> String {
    if extras.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = extras.iter().map(|d| d.name).collect();
    format!(" (and {})", names.join(", "))
}

pub async fn install_dependencies(
    ctx: StepContext<'_>,
    installer: &dyn PackageInstaller,
    extras: &[Dependency],
) -> Result<InstallOutcome> {
    ctx.reporter.info("all ready for the installation step");

    let suffix = with_extras(extras);
    let target = ctx.settings.target_package.clone();
    let extra_specs: Vec<String> = extras.iter().map(|d| d.spec.to_string()).collect();

    let install = ctx
        .prompter
        .confirm(&format!("should we install jsreport v2{suffix} now?"), true)?;

    if !install {
        let mut packages = vec![target];
        packages.extend(extra_specs);
        return Ok(InstallOutcome::Deferred {
            command: manual_install_command(&packages),
        });
    }

    let progress = ctx.reporter.progress("installing jsreport v2");

    installer
        .install(ctx.project_dir, std::slice::from_ref(&target))
        .await
        .inspect_err(|_| progress.fail(None))?;

    if !extra_specs.is_empty() {
        let names: Vec<&str> = extras.iter().map(|d| d.name).collect();
        progress.relabel(&format!(
            "installing additional extensions {}",
            names.join(", ")
        ));
        installer
            .install(ctx.project_dir, &extra_specs)
            .await
            .inspect_err(|_| progress.fail(None))?;
    }

    info!(%target, extras = ?extra_specs, "dependencies installed");
    progress.succeed(&format!("jsreport v2{suffix} installed successfully"));
    Ok(InstallOutcome::Installed)
}
