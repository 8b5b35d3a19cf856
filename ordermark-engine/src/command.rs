//! Command boundary.
//!
//! Hosts invoke numbering as named commands. A command never panics or
//! propagates an error past this point: cancellation is quiet and any other
//! failure is logged and handed back as [`CommandOutcome::Failed`].

use crate::error::{EngineError, EngineResult};
use crate::writer::WriteReport;
use tracing::{error, info, info_span};

/// How a command ended.
#[derive(Debug)]
pub enum CommandOutcome {
    Completed(WriteReport),
    /// The user backed out. Nothing was written.
    Canceled,
    Failed(EngineError),
}

impl CommandOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn report(&self) -> Option<&WriteReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Runs `body` as the command `name`.
pub fn run_command<F>(name: &str, body: F) -> CommandOutcome
where
    F: FnOnce() -> EngineResult<WriteReport>,
{
    let _span = info_span!("command", name).entered();
    match body() {
        Ok(report) => {
            for entry in report.entries() {
                info!(
                    severity = ?entry.severity,
                    entities = entry.entities.len(),
                    "{}",
                    entry.message
                );
            }
            CommandOutcome::Completed(report)
        }
        Err(EngineError::Canceled) => {
            info!("Command canceled");
            CommandOutcome::Canceled
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            CommandOutcome::Failed(e)
        }
    }
}
