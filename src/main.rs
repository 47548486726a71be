mod cli;
mod core;
mod logging;
mod steps;

use crate::core::terminal::ConsoleReporter;
use crate::steps::MigrationState;

#[tokio::main]
async fn main() {
    let state = MigrationState::default();

    if let Err(e) = cli::run_main(&state).await {
        cli::failure_action(&e, &state).perform(&ConsoleReporter);
    }
}
