//! Check orchestration: quiet-window gate, fetch, assertions, retries, and
//! recording the final outcome.

use chrono::Utc;
use pingu_core::{backoff, Episode, InvalidWindowPolicy, QuietWindows, RetryIncrement, Status};
use pingu_store::{Backend, HistoryStore};
use tracing::{debug, info};

use crate::assertion::AssertionSet;
use crate::clock::{Clock, Sleeper, SystemClock, ThreadSleeper};
use crate::error::{CheckError, CheckResult};
use crate::fetch::{Fetched, Fetcher};
use crate::reporter::{ConsoleReporter, Reporter, Verbosity};

/// Failure message recorded when the resource could not be fetched at all.
pub const FETCH_FAILED_MESSAGE: &str = "could not fetch resource";

/// Everything a caller supplies for one check, before validation.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub url: String,
    pub expected_status: u16,
    pub expected_content: Option<String>,
    pub retries: u32,
    pub retry_increment: u32,
    pub quiet_windows: Vec<String>,
    pub invalid_window: InvalidWindowPolicy,
}

impl CheckRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            expected_status: 200,
            expected_content: None,
            retries: 0,
            retry_increment: RetryIncrement::LINEAR.get(),
            quiet_windows: Vec::new(),
            invalid_window: InvalidWindowPolicy::default(),
        }
    }
}

/// A validated check. Building one performs every configuration check, so
/// a plan that exists can run without configuration errors.
#[derive(Debug, Clone)]
pub struct CheckPlan {
    url: String,
    assertions: AssertionSet,
    retries: u32,
    increment: RetryIncrement,
    windows: QuietWindows,
}

impl CheckPlan {
    pub fn build(request: &CheckRequest) -> CheckResult<Self> {
        let increment = RetryIncrement::new(request.retry_increment)?;
        let windows = QuietWindows::parse_all(&request.quiet_windows, request.invalid_window)?;
        let assertions = AssertionSet::build(request.expected_status, request.expected_content.as_deref())?;
        debug!(
            url = %request.url,
            assertions = assertions.len(),
            windows = windows.len(),
            retries = request.retries,
            "check plan built"
        );
        Ok(Self {
            url: request.url.clone(),
            assertions,
            retries: request.retries,
            increment,
            windows,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn retries(&self) -> u32 {
        self.retries
    }

    fn increment(&self) -> RetryIncrement {
        self.increment
    }

    fn windows(&self) -> &QuietWindows {
        &self.windows
    }
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// A quiet window was active; nothing was fetched or recorded.
    Suppressed { window: String },
    Passed { episode: Episode, attempts: u32 },
    Failed {
        episode: Episode,
        message: String,
        attempts: u32,
    },
}

impl CheckOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckOutcome::Failed { .. })
    }

    /// The current episode after recording, if anything was recorded.
    pub fn episode(&self) -> Option<&Episode> {
        match self {
            CheckOutcome::Suppressed { .. } => None,
            CheckOutcome::Passed { episode, .. } | CheckOutcome::Failed { episode, .. } => Some(episode),
        }
    }

    /// Whether a failure has run long enough to alert on.
    pub fn should_alert(&self, threshold: u64) -> bool {
        match self {
            CheckOutcome::Failed { episode, .. } => episode.count >= threshold,
            _ => false,
        }
    }
}

/// Runs checks against injected collaborators.
pub struct Checker {
    fetcher: Box<dyn Fetcher>,
    clock: Box<dyn Clock>,
    sleeper: Box<dyn Sleeper>,
    reporter: Box<dyn Reporter>,
}

impl Checker {
    /// A checker using the system clock, real sleeps, and stdout at normal verbosity.
    pub fn new(fetcher: impl Fetcher + 'static) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            clock: Box::new(SystemClock),
            sleeper: Box::new(ThreadSleeper),
            reporter: Box::new(ConsoleReporter::stdout(Verbosity::Normal)),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Validate `request` and run it.
    pub fn run<B: Backend>(&mut self, request: &CheckRequest, store: &mut HistoryStore<B>) -> CheckResult<CheckOutcome> {
        let plan = CheckPlan::build(request)?;
        self.run_check(&plan, store)
    }

    /// Run a validated plan and record its outcome in `store`.
    pub fn run_check<B: Backend>(&mut self, plan: &CheckPlan, store: &mut HistoryStore<B>) -> CheckResult<CheckOutcome> {
        match self.gate(plan) {
            Some(suppressed) => Ok(suppressed),
            None => self.execute(plan, store),
        }
    }

    /// Evaluate the plan's quiet windows against the current instant.
    /// Returns `Suppressed` when one is active; nothing is fetched or stored.
    pub fn gate(&mut self, plan: &CheckPlan) -> Option<CheckOutcome> {
        let url = plan.url();
        let now = self.clock.now();
        let window = plan.windows().first_active(now.naive_local())?;
        info!(%url, window = %window.spec(), "quiet window active, check skipped");
        self.reporter.suppressed(url, window.spec());
        Some(CheckOutcome::Suppressed {
            window: window.spec().to_string(),
        })
    }

    /// Fetch, assert, retry, and record, without consulting quiet windows.
    /// Callers that open storage lazily run [`Checker::gate`] first.
    pub fn execute<B: Backend>(&mut self, plan: &CheckPlan, store: &mut HistoryStore<B>) -> CheckResult<CheckOutcome> {
        let url = plan.url();

        let mut attempts = 1;
        let mut failure = self.attempt(plan);
        while failure.is_some() && attempts <= plan.retries() {
            let wait = backoff(attempts, plan.increment());
            debug!(%url, attempt = attempts, wait_secs = wait.as_secs(), "retrying after failure");
            self.reporter.retry(attempts, wait);
            self.sleeper.sleep(wait);
            failure = self.attempt(plan);
            attempts += 1;
        }

        let recorded_at = self.clock.now().with_timezone(&Utc);
        let storage_err = |source| CheckError::Storage {
            url: url.to_string(),
            source,
        };

        match failure {
            None => {
                let episode = store.save(Status::Pass, "", recorded_at).map_err(storage_err)?;
                info!(%url, attempts, count = episode.count, "check passed");
                self.reporter.passed(url);
                Ok(CheckOutcome::Passed { episode, attempts })
            }
            Some(messages) => {
                let message = messages.join("; ");
                let episode = store.save(Status::Fail, &message, recorded_at).map_err(storage_err)?;
                info!(%url, attempts, count = episode.count, %message, "check failed");
                self.reporter.failed(url, &message);
                Ok(CheckOutcome::Failed {
                    episode,
                    message,
                    attempts,
                })
            }
        }
    }

    /// One fetch plus assertions. Returns the failure messages, if any.
    fn attempt(&mut self, plan: &CheckPlan) -> Option<Vec<String>> {
        let url = plan.url();
        self.reporter.fetching(url);

        let response = match self.fetcher.fetch(url) {
            Fetched::Response(response) => response,
            Fetched::TransportFailed(reason) => {
                self.reporter.fetch_failed(url, &reason);
                return Some(vec![FETCH_FAILED_MESSAGE.to_string()]);
            }
        };

        self.reporter.indent();
        let reporter = &mut self.reporter;
        let failure = plan
            .assertions
            .evaluate(&response, |assertion, result| reporter.assertion(assertion, result));
        self.reporter.dedent();

        failure.map(|result| vec![result.message])
    }
}
