//! The v1 → v2 migration pipeline.
//!
//! Steps run strictly in order; each one reads the store state the previous
//! step left behind. Any error aborts the pipeline. There is no rollback.

mod backup;
mod config;
mod images;
mod initialize;
mod install_deps;
mod installation;
mod ready;
mod recipes;
mod schedules;
mod scripts;

#[cfg(test)]
mod tests;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use crate::core::installer::PackageInstaller;
use crate::core::prompt::Prompter;
use crate::core::settings::Settings;
use crate::core::terminal::Reporter;

pub use install_deps::InstallOutcome;

/// Everything a step needs besides the instance.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    pub project_dir: &'a Path,
    pub settings: &'a Settings,
    pub prompter: &'a dyn Prompter,
    pub reporter: &'a dyn Reporter,
}

/// Progress flags shared with the interrupt handler.
#[derive(Debug, Clone, Default)]
pub struct MigrationState {
    started: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl MigrationState {
    pub fn mark_started(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Writes may have happened and the pipeline has not completed.
    pub fn in_flight(&self) -> bool {
        self.started() && !self.finished.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Operator was not ready. Nothing touched.
    NotReady,
    /// Operator has no backup yet. Nothing touched.
    NotBackedUp,
    Completed(InstallOutcome),
}

/// Extra package required by an outcome of the recipe checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub name: &'static str,
    pub spec: &'static str,
}

pub const PHANTOM_PDF: Dependency = Dependency {
    name: "jsreport-phantom-pdf",
    spec: "jsreport-phantom-pdf@2.x.x",
};

pub const FOP_PDF: Dependency = Dependency {
    name: "jsreport-fop-pdf",
    spec: "jsreport-fop-pdf@2.x.x",
};

fn extra_dependencies(keep_phantom: bool, install_fop: bool) -> Vec<Dependency> {
    let mut deps = Vec::new();
    if keep_phantom {
        deps.push(PHANTOM_PDF);
    }
    if install_fop {
        deps.push(FOP_PDF);
    }
    deps
}

pub async fn run_pipeline(
    ctx: StepContext<'_>,
    installer: &dyn PackageInstaller,
    state: &MigrationState,
) -> Result<MigrationOutcome> {
    if !ready::ready_to_start(ctx)? {
        return Ok(MigrationOutcome::NotReady);
    }
    ctx.reporter.blank();

    let installation = installation::check_installation(ctx).await?;
    ctx.reporter.blank();

    if !backup::confirm_backup(ctx)? {
        return Ok(MigrationOutcome::NotBackedUp);
    }
    ctx.reporter.blank();

    let instance = initialize::initialize_instance(ctx, &installation).await?;
    ctx.reporter.blank();

    state.mark_started();
    info!("migration started");

    images::migrate_images(ctx, &instance).await?;
    ctx.reporter.blank();

    scripts::check_scripts(ctx, &instance).await?;
    ctx.reporter.blank();

    let keep_phantom = recipes::check_phantom_pdf(ctx, &instance).await?;
    ctx.reporter.blank();

    let install_fop = recipes::check_fop_pdf(ctx, &instance).await?;
    ctx.reporter.blank();

    config::migrate_config(ctx, &instance, keep_phantom).await?;
    ctx.reporter.blank();

    schedules::migrate_schedules(ctx, &instance).await?;
    ctx.reporter.blank();

    let extras = extra_dependencies(keep_phantom, install_fop);
    let outcome = install_deps::install_dependencies(ctx, installer, &extras).await?;

    state.mark_finished();
    info!(?outcome, "migration finished");
    Ok(MigrationOutcome::Completed(outcome))
}
