mod cleanup;
mod outcome;
mod reporter;
mod scope;

use std::{
    cell::RefCell,
    fmt, io,
    panic::{AssertUnwindSafe, catch_unwind},
    process,
    time::Duration,
};

pub use cleanup::{CleanupActionError, CleanupState};
pub use outcome::{Failure, RunOutcome};
pub use reporter::{TestReporter, eventually, require_eventually};
pub use scope::{ScopeEnd, ScopeError, TimeoutScope};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use self::cleanup::{CleanupAction, CleanupStack, panic_message, run_isolated};
use crate::{adjust_timeout, constants::default_timeout, network::DynError};

/// Per-run context shared by every test step.
///
/// Owns the cleanup stack, the default timeout and the failures recorded so
/// far. It is deliberately `!Sync`: registration, polling and failure
/// reporting all happen on the thread that owns the context. Timeout scopes
/// handed out by the context may be moved to other tasks.
pub struct TestContext {
    default_timeout: Duration,
    cleanup: RefCell<CleanupStack>,
    failures: RefCell<Vec<Failure>>,
    root: CancellationToken,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeout(adjust_timeout(default_timeout()))
    }

    #[must_use]
    pub fn new_with_timeout(default_timeout: Duration) -> Self {
        Self {
            default_timeout,
            cleanup: RefCell::new(CleanupStack::new()),
            failures: RefCell::new(Vec::new()),
            root: CancellationToken::new(),
        }
    }

    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Scope that ends after `timeout`, on `cancel`, or at teardown.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> TimeoutScope {
        TimeoutScope::new(&self.root, timeout)
    }

    #[must_use]
    pub fn with_default_timeout(&self) -> TimeoutScope {
        self.with_timeout(self.default_timeout)
    }

    /// Register `action` to run at teardown, after every action registered
    /// before it.
    pub fn defer_cleanup<F>(&self, action: F)
    where
        F: FnOnce() + 'static,
    {
        self.register(Box::new(move || {
            action();
            Ok(())
        }));
    }

    /// Like [`Self::defer_cleanup`]; an `Err` counts as a failed cleanup.
    pub fn defer_fallible_cleanup<F>(&self, action: F)
    where
        F: FnOnce() -> Result<(), DynError> + 'static,
    {
        self.register(Box::new(action));
    }

    fn register(&self, action: CleanupAction) {
        let refused = self.cleanup.borrow_mut().push(action);
        if let Err(err) = refused {
            warn!(error = %err, "dropping cleanup registered during teardown");
            self.record_failure(Failure::LateRegistration);
        }
    }

    #[must_use]
    pub fn cleanup_state(&self) -> CleanupState {
        self.cleanup.borrow().state()
    }

    /// Run every registered cleanup once, in registration order.
    ///
    /// Each action is isolated: a panic or error is logged, recorded as a
    /// failure, and the next action still runs. Calling this again after the
    /// stack drained runs nothing and reports the same outcome.
    pub fn cleanup(&self) -> RunOutcome {
        let actions = self.cleanup.borrow_mut().begin_drain();
        let Some(actions) = actions else {
            debug!(state = ?self.cleanup_state(), "cleanup already ran");
            return self.outcome();
        };

        if !actions.is_empty() {
            info!(actions = actions.len(), "running cleanup");
        }

        for (index, action) in actions.into_iter().enumerate() {
            if let Err(err) = run_isolated(index, action) {
                warn!(error = %err, "recovered from failed cleanup action");
                self.record_failure(Failure::Cleanup(err));
            }
        }

        self.cleanup.borrow_mut().finish_drain();
        self.root.cancel();

        let outcome = self.outcome();
        if let RunOutcome::Failed { failures } = &outcome {
            error!(failures = failures.len(), "run finished with failures");
        }
        outcome
    }

    /// Failure-path teardown: record `failure` first, then clean up.
    pub fn cleanup_after(&self, failure: Failure) -> RunOutcome {
        self.record_failure(failure);
        self.cleanup()
    }

    /// Run `body`, then tear down no matter how it ended. A panic in `body`
    /// is recorded as a failure before cleanup starts.
    pub fn run<F>(&self, body: F) -> RunOutcome
    where
        F: FnOnce(&Self),
    {
        match catch_unwind(AssertUnwindSafe(|| body(self))) {
            Ok(()) => self.cleanup(),
            Err(panic) => {
                let message = panic_message(panic);
                error!(%message, "assertion failure");
                self.cleanup_after(Failure::Panic(message))
            }
        }
    }

    pub fn record_failure(&self, failure: Failure) {
        self.failures.borrow_mut().push(failure);
    }

    #[must_use]
    pub fn failures(&self) -> Vec<Failure> {
        self.failures.borrow().clone()
    }

    #[must_use]
    pub fn is_failing(&self) -> bool {
        !self.failures.borrow().is_empty()
    }

    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        RunOutcome::from_failures(self.failures())
    }

    /// Mark the start of a named step.
    pub fn by(&self, step: &str) {
        info!("STEP: {step}");
    }

    pub fn outf(&self, args: fmt::Arguments<'_>) {
        info!("{args}");
    }

    /// See [`eventually`].
    pub fn eventually<C>(&self, condition: C, wait_for: Duration, tick: Duration, message: &str) -> bool
    where
        C: FnMut() -> bool,
    {
        eventually(self, condition, wait_for, tick, message)
    }

    /// See [`require_eventually`].
    pub fn require_eventually<C>(&self, condition: C, wait_for: Duration, tick: Duration, message: &str)
    where
        C: FnMut() -> bool,
    {
        require_eventually(self, condition, wait_for, tick, message);
    }
}

impl TestReporter for TestContext {
    fn errorf(&self, args: fmt::Arguments<'_>) {
        let message = args.to_string();
        error!(%message, "test failure recorded");
        self.record_failure(Failure::Assertion(message));
    }

    fn fail_now(&self) -> ! {
        self.record_failure(Failure::Aborted);

        // Unwind into the drain loop so the remaining actions still run.
        if self.cleanup_state() == CleanupState::Draining {
            panic!("fail_now invoked from a cleanup action");
        }

        let outcome = self.cleanup();
        error!(code = outcome.code(), "failing run");
        process::exit(outcome.code());
    }

    fn writer(&self) -> Box<dyn io::Write> {
        Box::new(io::stdout())
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let state = self.cleanup_state();
        if matches!(state, CleanupState::Empty | CleanupState::Growing) {
            if state == CleanupState::Growing {
                warn!("test context dropped before teardown; running cleanup");
            }
            if let RunOutcome::Failed { failures } = self.cleanup() {
                for failure in &failures {
                    error!(%failure, "test context dropped with failure");
                }
            }
        }
    }
}
