mod command;
mod diagnostic;

pub use command::CommandResult;
pub use diagnostic::{DiagnosticOccurrence, DiagnosticSet};
