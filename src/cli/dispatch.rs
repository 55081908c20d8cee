//! Command dispatch logic extracted from binary to reduce main function size.

use super::args::{BatchArgs, Commands, MetricsCommand};
use super::handlers::{self, Session};
use crate::exit::AtomfixExit;
use anyhow::Result;

/// Executes the parsed command.
///
/// # Errors
/// Returns error if the command handler fails.
pub fn execute(session: &Session, command: Commands) -> Result<AtomfixExit> {
    match command {
        Commands::Collect => handlers::handle_collect(session),
        Commands::Plan => handlers::handle_plan(session),
        Commands::Processors => handlers::handle_processors(session),
        Commands::Execute { code, confirm } => handlers::handle_execute(session, &code, confirm),
        Commands::Batch {
            codes,
            confirm,
            stop_on_failure,
            pause,
        } => handlers::handle_batch(
            session,
            &BatchArgs {
                codes,
                confirm,
                stop_on_failure,
                pause,
            },
        ),
        Commands::Gate { enforce, snapshot } => {
            handlers::handle_gate(session, enforce, snapshot.as_deref())
        }
        Commands::Pipeline => handlers::handle_pipeline(session),
        Commands::Metrics(sub) => handle_metrics(session, sub),
    }
}

fn handle_metrics(session: &Session, command: MetricsCommand) -> Result<AtomfixExit> {
    match command {
        MetricsCommand::Record => handlers::handle_record(session),
        MetricsCommand::Trend { days } => handlers::handle_trend(session, days),
        MetricsCommand::Diff { from, to } => handlers::handle_diff(session, &from, &to),
        MetricsCommand::Export { format } => handlers::handle_export(session, format),
    }
}
