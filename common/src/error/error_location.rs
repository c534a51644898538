use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location as PanicLocation;

/// Source location attached to every structured error in the workspace.
///
/// Error variants carry one of these so a log line alone is enough to find
/// the failing call site. Construct it at the error site with
/// `ErrorLocation::from(Location::caller())` inside a `#[track_caller]`
/// context.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErrorLocation {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl ErrorLocation {
    pub const fn from(location: &'static PanicLocation<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl Display for ErrorLocation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "[{}:{}:{}]", self.file, self.line, self.column)
    }
}
