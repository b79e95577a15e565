//! pingu-check — a single URL check with retries.
//!
//! Runs the configured assertions against a fetched URL, retries failures
//! with a power-law backoff, and records the final outcome in the URL's
//! history. Each invocation performs one check; scheduling is left to cron
//! or a similar tool.
//!
//! # Architecture
//!
//! ```text
//! Checker::run_check(plan, store)
//!   ├── QuietWindows gate (no fetch, no store write when active)
//!   ├── Fetcher::fetch() → Fetched
//!   ├── AssertionSet::evaluate() → first failure, if any
//!   ├── retry loop: backoff(attempt, increment) → Sleeper::sleep()
//!   └── HistoryStore::save() → CheckOutcome
//! ```
//!
//! Every side effect (network, clock, sleep, console output) sits behind a
//! trait so the orchestrator can be driven entirely by fakes.

pub mod assertion;
pub mod checker;
pub mod clock;
pub mod error;
pub mod fetch;
pub mod reporter;

pub use assertion::{Assert, Assertion, AssertionResult, AssertionSet, ContentAssertion, StatusCodeAssertion};
pub use checker::{CheckOutcome, CheckPlan, CheckRequest, Checker, FETCH_FAILED_MESSAGE};
pub use clock::{Clock, Sleeper, SystemClock, ThreadSleeper};
pub use error::{CheckError, CheckResult};
pub use fetch::{Fetched, Fetcher, HttpFetcher, Response};
pub use reporter::{ConsoleReporter, Reporter, Verbosity};
