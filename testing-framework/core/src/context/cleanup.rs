use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
};

use thiserror::Error;

use crate::network::DynError;

pub(crate) type CleanupAction = Box<dyn FnOnce() -> Result<(), DynError>>;

/// Lifecycle of a cleanup stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CleanupState {
    Empty,
    Growing,
    Draining,
    Drained,
}

/// A cleanup action that did not complete.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CleanupActionError {
    #[error("cleanup action #{index} panicked: {message}")]
    Panicked { index: usize, message: String },
    #[error("cleanup action #{index} failed: {message}")]
    Failed { index: usize, message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cleanup registration refused: stack is {state:?}")]
pub(crate) struct RegistrationClosed {
    pub(crate) state: CleanupState,
}

/// Ordered, append-only list of cleanup actions that is drained exactly once.
pub(crate) struct CleanupStack {
    actions: Vec<CleanupAction>,
    state: CleanupState,
}

impl CleanupStack {
    pub(crate) const fn new() -> Self {
        Self {
            actions: Vec::new(),
            state: CleanupState::Empty,
        }
    }

    pub(crate) const fn state(&self) -> CleanupState {
        self.state
    }

    pub(crate) fn push(&mut self, action: CleanupAction) -> Result<(), RegistrationClosed> {
        match self.state {
            CleanupState::Empty | CleanupState::Growing => {
                self.actions.push(action);
                self.state = CleanupState::Growing;
                Ok(())
            }
            state @ (CleanupState::Draining | CleanupState::Drained) => {
                Err(RegistrationClosed { state })
            }
        }
    }

    /// Closes the stack and hands out every registered action in registration
    /// order. Returns `None` once draining has begun.
    pub(crate) fn begin_drain(&mut self) -> Option<Vec<CleanupAction>> {
        match self.state {
            CleanupState::Empty | CleanupState::Growing => {
                self.state = CleanupState::Draining;
                Some(std::mem::take(&mut self.actions))
            }
            CleanupState::Draining | CleanupState::Drained => None,
        }
    }

    pub(crate) fn finish_drain(&mut self) {
        self.state = CleanupState::Drained;
    }
}

/// Runs one action, turning an error or a panic into a value.
pub(crate) fn run_isolated(index: usize, action: CleanupAction) -> Result<(), CleanupActionError> {
    match catch_unwind(AssertUnwindSafe(action)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(CleanupActionError::Failed {
            index,
            message: source.to_string(),
        }),
        Err(panic) => Err(CleanupActionError::Panicked {
            index,
            message: panic_message(panic),
        }),
    }
}

/// Attempts to turn a panic payload into a readable string for diagnostics.
pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic.downcast::<String>().map_or_else(
        |panic| {
            panic.downcast::<&'static str>().map_or_else(
                |_| "unknown panic".to_owned(),
                |message| (*message).to_owned(),
            )
        },
        |message| *message,
    )
}
