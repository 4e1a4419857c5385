use std::{fmt, process::ExitCode};

use super::cleanup::CleanupActionError;

/// A failure recorded against a test context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    /// Reported through `errorf` or a failed `eventually`.
    Assertion(String),
    /// The run body panicked.
    Panic(String),
    /// `fail_now` was invoked.
    Aborted,
    Cleanup(CleanupActionError),
    /// A cleanup was registered after teardown began and never ran.
    LateRegistration,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assertion(message) => write!(f, "assertion failure: {message}"),
            Self::Panic(message) => write!(f, "panic: {message}"),
            Self::Aborted => f.write_str("run aborted via fail_now"),
            Self::Cleanup(err) => write!(f, "{err}"),
            Self::LateRegistration => f.write_str("cleanup registered after teardown began"),
        }
    }
}

/// Result of a run as seen at teardown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Passed,
    Failed { failures: Vec<Failure> },
}

impl RunOutcome {
    pub(crate) fn from_failures(failures: Vec<Failure>) -> Self {
        if failures.is_empty() {
            Self::Passed
        } else {
            Self::Failed { failures }
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Passed)
    }

    #[must_use]
    pub fn failures(&self) -> &[Failure] {
        match self {
            Self::Passed => &[],
            Self::Failed { failures } => failures,
        }
    }

    #[must_use]
    pub const fn code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}
