use std::{
    fmt, io,
    thread::sleep,
    time::{Duration, Instant},
};

use tracing::debug;

/// Capabilities assertion helpers need from the context that owns a run.
///
/// Implementations are bound to one thread: helpers call back into the
/// reporter from the thread that invoked them and never from a worker.
pub trait TestReporter {
    /// Record a failure without stopping execution.
    fn errorf(&self, args: fmt::Arguments<'_>);

    /// Tear the run down and terminate the process with a failure status.
    fn fail_now(&self) -> !;

    /// Sink for human-readable output.
    fn writer(&self) -> Box<dyn io::Write>;
}

/// Evaluates `condition` every `tick` on the calling thread until it holds or
/// `wait_for` elapses. On timeout `message` is recorded through the reporter
/// and `false` is returned.
pub fn eventually<R, C>(
    reporter: &R,
    mut condition: C,
    wait_for: Duration,
    tick: Duration,
    message: &str,
) -> bool
where
    R: TestReporter + ?Sized,
    C: FnMut() -> bool,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        sleep(tick);
        attempts += 1;

        if condition() {
            debug!(attempts, elapsed = ?started.elapsed(), "condition satisfied");
            return true;
        }

        if started.elapsed() >= wait_for {
            reporter.errorf(format_args!(
                "condition never satisfied after {attempts} attempts over {wait_for:?}: {message}"
            ));
            return false;
        }
    }
}

/// Like [`eventually`], but fails the run immediately on timeout.
pub fn require_eventually<R, C>(
    reporter: &R,
    condition: C,
    wait_for: Duration,
    tick: Duration,
    message: &str,
) where
    R: TestReporter + ?Sized,
    C: FnMut() -> bool,
{
    if !eventually(reporter, condition, wait_for, tick, message) {
        reporter.fail_now();
    }
}
