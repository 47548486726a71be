use anyhow::Result;
use console::style;
use std::path::Path;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::installer::NpmInstaller;
use crate::core::prompt::{InquirePrompter, is_prompt_cancellation};
use crate::core::settings::Settings;
use crate::core::terminal::{
    ConsoleReporter, Reporter, print_banner, print_goodbye, print_success, print_warn,
};
use crate::steps::{InstallOutcome, MigrationOutcome, MigrationState, StepContext, run_pipeline};

const RESTORE_FROM_BACKUP: &str = "you should restore your project from your backup before running the \
                                   migration again to ensure the migration can complete correctly in next run.";

fn print_welcome(reporter: &dyn Reporter) {
    print_banner();
    reporter.line(&format!(
        "  {}\n",
        style("Welcome to migration utility that will help you upgrade from jsreport v1 to v2!")
            .bold()
            .cyan()
    ));

    reporter.info("Make sure to check or do the following first before start the migration:\n");
    reporter.line(" - update your project and check it works with latest jsreport v1 version.");
    reporter.line(" - backup somewhere your jsreport app and data first before running the migration.");
    reporter.line(
        "\nFinally, make sure to follow all the steps and answer any question during the migration process.\n",
    );

    reporter.warn(
        "In case of any error during the process you can contact us and describe the error by \
         creating a github issue (https://github.com/jsreport/jsreport-migration/issues) or opening \
         a new topic in our forum (https://forum.jsreport.net/).",
    );
    reporter.line("\n");
}

/// How the process ends after an interrupt or a failed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitAction {
    /// No migration is left half-done. Say goodbye and exit 0.
    Goodbye,
    /// Report each line as a failure and exit 1.
    Fail(Vec<String>),
}

impl ExitAction {
    pub fn code(&self) -> i32 {
        match self {
            ExitAction::Goodbye => 0,
            ExitAction::Fail(_) => 1,
        }
    }

    pub fn perform(&self, reporter: &dyn Reporter) -> ! {
        match self {
            ExitAction::Goodbye => print_goodbye(),
            ExitAction::Fail(lines) => {
                reporter.blank();
                for line in lines {
                    reporter.fail(line);
                }
            }
        }
        std::process::exit(self.code())
    }
}

/// Decides the exit for an interrupt or termination signal.
pub fn interrupt_action(state: &MigrationState) -> ExitAction {
    if state.in_flight() {
        ExitAction::Fail(vec![format!("MIGRATION CANCELED UNEXPECTEDLY! {}", RESTORE_FROM_BACKUP)])
    } else {
        ExitAction::Goodbye
    }
}

/// Decides the exit for an error returned by the wizard.
///
/// Cancelling a prompt before the first write is an opt-out, not a failure.
pub fn failure_action(err: &anyhow::Error, state: &MigrationState) -> ExitAction {
    if is_prompt_cancellation(err) && !state.started() {
        return ExitAction::Goodbye;
    }
    let mut lines = vec![format!("Error found during the migration: {:#}", err)];
    if state.started() {
        lines.push(RESTORE_FROM_BACKUP.to_string());
    }
    ExitAction::Fail(lines)
}

/// Resolves on Ctrl-C or SIGTERM.
#[cfg(unix)]
async fn termination_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Watches for an interrupt or termination signal until `done` fires.
///
/// A signal between the first write and completion leaves partial state,
/// so the operator is told to restore from backup.
fn spawn_interrupt_watcher(state: MigrationState, done: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = done.cancelled() => {}
            signal = termination_signal() => {
                if let Err(e) = signal {
                    warn!("failed to listen for termination signals: {}", e);
                    return;
                }
                interrupt_action(&state).perform(&ConsoleReporter);
            }
        }
    })
}

fn report_outcome(outcome: &MigrationOutcome) {
    match outcome {
        MigrationOutcome::NotReady => {
            println!("\ntake your time and run the CLI again when you are ready.");
        }
        MigrationOutcome::NotBackedUp => {
            println!(
                "\ntake your time and ensure that your jsreport app and data are backed up somewhere, \
                 then run the CLI again when you are ready."
            );
        }
        MigrationOutcome::Completed(install) => {
            println!("\n");
            print_warn(
                "All done! just remember that you should not run the migration again in this project or \
                 you could have unexpected results. If for some reason you want to re-run the migration \
                 you should restore your project from your backup and try the migration again from there.",
            );
            println!("\n");

            match install {
                InstallOutcome::Installed => print_success("MIGRATION COMPLETED! ENJOY"),
                InstallOutcome::Deferred { command } => print_warn(&format!(
                    "MIGRATION COMPLETED! but you selected to not install jsreport v2 right now. \
                     remember to do it before starting your project. you can do it using \"{}\" command",
                    command
                )),
            }
        }
    }
}

pub async fn run_migration_wizard(
    project_dir: &Path,
    settings: &Settings,
    state: &MigrationState,
) -> Result<MigrationOutcome> {
    let reporter = ConsoleReporter;
    print_welcome(&reporter);

    let done = CancellationToken::new();
    let watcher = spawn_interrupt_watcher(state.clone(), done.clone());

    let prompter = InquirePrompter;
    let installer = NpmInstaller::new(settings.npm_command.clone());
    let ctx = StepContext {
        project_dir,
        settings,
        prompter: &prompter,
        reporter: &reporter,
    };

    let result = run_pipeline(ctx, &installer, state).await;

    done.cancel();
    if let Err(e) = watcher.await {
        warn!("interrupt watcher ended abnormally: {}", e);
    }

    let outcome = result?;
    info!(?outcome, "wizard finished");
    report_outcome(&outcome);
    Ok(outcome)
}
