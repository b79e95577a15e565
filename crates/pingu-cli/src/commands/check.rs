//! `pingu check` runs one check, records it, and alerts on sustained failure.

use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;
use pingu_check::{CheckOutcome, CheckPlan, CheckRequest, Checker, ConsoleReporter, HttpFetcher, Verbosity};
use pingu_core::{InvalidWindowPolicy, PinguConfig};
use pingu_notify::{EmailMessage, Notifier};
use tracing::info;

use super::{Context, EmailArgs, TargetArgs};

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Expected HTTP status [default: 200].
    #[arg(short = 'e', long, help_heading = "Assertion options")]
    pub expect_status: Option<u16>,

    /// Regular expression the response body must match.
    #[arg(short = 'c', long, help_heading = "Assertion options")]
    pub expect_content: Option<String>,

    /// Quiet windows during which the check is skipped, separated by
    /// semicolons. Example: 'SAT 10:00PM - SUN 1:00AM'
    #[arg(long, value_delimiter = ';')]
    pub ignore_period: Vec<String>,

    /// Skip malformed quiet windows with a warning instead of failing.
    #[arg(long)]
    pub ignore_invalid_periods: bool,

    /// Number of retries after a failed check.
    #[arg(short = 'r', long)]
    pub retries: Option<u32>,

    /// Power applied to the retry number to get the wait in seconds, 1 to 3.
    /// With 3 the waits are 1, 8, 27...
    #[arg(short = 'i', long)]
    pub retry_increment: Option<u32>,

    /// Alert once this many consecutive failures have been recorded.
    #[arg(short = 'a', long)]
    pub alert_threshold: Option<u64>,

    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    #[command(flatten)]
    pub email: EmailArgs,
}

impl CheckArgs {
    /// Merge flags over the config file into a check request.
    pub fn request(&self, config: &PinguConfig) -> CheckRequest {
        let check = config.check();
        let retry = config.retry();

        let mut request = CheckRequest::new(&self.target.url);
        request.expected_status = self
            .expect_status
            .or(check.expect_status)
            .unwrap_or(request.expected_status);
        request.expected_content = self.expect_content.clone().or(check.expect_content);
        request.quiet_windows = if self.ignore_period.is_empty() {
            check.ignore_periods.unwrap_or_default()
        } else {
            self.ignore_period.clone()
        };
        request.invalid_window = if self.ignore_invalid_periods {
            InvalidWindowPolicy::Ignore
        } else {
            check.invalid_window.unwrap_or_default()
        };
        request.retries = self.retries.or(retry.retries).unwrap_or(0);
        request.retry_increment = self
            .retry_increment
            .or(retry.increment)
            .unwrap_or(request.retry_increment);
        request
    }

    pub fn alert_threshold(&self, config: &PinguConfig) -> u64 {
        self.alert_threshold.or(config.alert().threshold).unwrap_or(0)
    }

    pub fn timeout(&self, config: &PinguConfig) -> Duration {
        self.timeout
            .or(config.check().timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(HttpFetcher::DEFAULT_TIMEOUT)
    }
}

pub fn check(ctx: &Context, args: &CheckArgs) -> Result<CheckOutcome> {
    let request = args.request(&ctx.config);
    let plan = CheckPlan::build(&request)?;
    let notifier = args.email.notifier(ctx.config.email())?;

    let fetcher = HttpFetcher::new(args.timeout(&ctx.config))?;
    let mut checker = Checker::new(fetcher).with_reporter(ConsoleReporter::stdout(ctx.verbosity));
    if let Some(suppressed) = checker.gate(&plan) {
        return Ok(suppressed);
    }

    let mut store = ctx.open_store(&request.url, args.target.store_name.as_deref())?;
    let outcome = checker.execute(&plan, &mut store)?;

    if let Some(notifier) = &notifier {
        let threshold = args.alert_threshold(&ctx.config);
        if send_alert(notifier, plan.url(), &outcome, threshold)? && ctx.verbosity >= Verbosity::Info {
            println!("Email alert sent.");
        }
    }
    Ok(outcome)
}

/// Send a failure alert if `outcome` has reached `threshold`. Returns whether
/// an alert went out.
pub fn send_alert(
    notifier: &dyn Notifier,
    url: &str,
    outcome: &CheckOutcome,
    threshold: u64,
) -> Result<bool> {
    let episode = match outcome.episode() {
        Some(episode) if outcome.should_alert(threshold) => episode,
        _ => return Ok(false),
    };
    info!(%url, count = episode.count, threshold, "sending failure alert");
    notifier
        .send(&EmailMessage::alert(url, episode))
        .context("failed to send alert email")?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use chrono::Utc;
    use pingu_core::config::{CheckConfig, RetryConfig};
    use pingu_core::{Episode, Status};
    use pingu_notify::NotifyResult;

    #[derive(Default)]
    struct RecordingNotifier(RefCell<Vec<EmailMessage>>);

    impl Notifier for RecordingNotifier {
        fn send(&self, message: &EmailMessage) -> NotifyResult<()> {
            self.0.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    fn args(url: &str) -> CheckArgs {
        CheckArgs {
            target: TargetArgs {
                url: url.into(),
                store_name: None,
            },
            expect_status: None,
            expect_content: None,
            ignore_period: Vec::new(),
            ignore_invalid_periods: false,
            retries: None,
            retry_increment: None,
            alert_threshold: None,
            timeout: None,
            email: EmailArgs::default(),
        }
    }

    fn failed(count: u64) -> CheckOutcome {
        let mut episode = Episode::open(Status::Fail, "down", Utc::now());
        episode.count = count;
        CheckOutcome::Failed {
            episode,
            message: "down".into(),
            attempts: 1,
        }
    }

    #[test]
    fn defaults_without_config() {
        let request = args("https://example.com").request(&PinguConfig::default());
        assert_eq!(request.expected_status, 200);
        assert_eq!(request.retries, 0);
        assert_eq!(request.retry_increment, 1);
        assert!(request.quiet_windows.is_empty());
        assert_eq!(request.invalid_window, InvalidWindowPolicy::Fail);
    }

    #[test]
    fn flags_win_over_config() {
        let config = PinguConfig {
            check: Some(CheckConfig {
                expect_status: Some(204),
                expect_content: Some("ok".into()),
                ignore_periods: Some(vec!["08:00 - 09:00".into()]),
                invalid_window: Some(InvalidWindowPolicy::Ignore),
                timeout_secs: Some(3),
            }),
            retry: Some(RetryConfig {
                retries: Some(2),
                increment: Some(2),
            }),
            ..Default::default()
        };

        let from_file = args("https://example.com").request(&config);
        assert_eq!(from_file.expected_status, 204);
        assert_eq!(from_file.quiet_windows, ["08:00 - 09:00"]);
        assert_eq!(from_file.retries, 2);
        assert_eq!(from_file.invalid_window, InvalidWindowPolicy::Ignore);
        assert_eq!(args("x").timeout(&config), Duration::from_secs(3));

        let mut flagged = args("https://example.com");
        flagged.expect_status = Some(200);
        flagged.ignore_period = vec!["SAT 22:00 - SUN 01:00".into()];
        flagged.retry_increment = Some(3);
        let request = flagged.request(&config);
        assert_eq!(request.expected_status, 200);
        assert_eq!(request.quiet_windows, ["SAT 22:00 - SUN 01:00"]);
        assert_eq!(request.retries, 2);
        assert_eq!(request.retry_increment, 3);
        assert_eq!(request.expected_content.as_deref(), Some("ok"));
    }

    #[test]
    fn alert_sent_at_threshold() {
        let notifier = RecordingNotifier::default();
        assert!(!send_alert(&notifier, "https://example.com", &failed(2), 3).unwrap());
        assert!(send_alert(&notifier, "https://example.com", &failed(3), 3).unwrap());

        let sent = notifier.0.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "URL CHECK FAILURE: https://example.com");
        assert!(sent[0].body.contains("URL CHECKED 3 TIMES."));
    }

    #[test]
    fn no_alert_without_failure() {
        let notifier = RecordingNotifier::default();
        let suppressed = CheckOutcome::Suppressed {
            window: "08:00 - 09:00".into(),
        };
        assert!(!send_alert(&notifier, "https://example.com", &suppressed, 0).unwrap());

        let passed = CheckOutcome::Passed {
            episode: Episode::open(Status::Pass, "", Utc::now()),
            attempts: 1,
        };
        assert!(!send_alert(&notifier, "https://example.com", &passed, 0).unwrap());
        assert!(notifier.0.borrow().is_empty());
    }

    #[test]
    fn check_against_unreachable_host_records_failure() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            config: PinguConfig::default(),
            verbosity: Verbosity::Normal,
            store_dir: Some(dir.path().to_path_buf()),
        };
        let mut args = args("http://127.0.0.1:1/");
        args.target.store_name = Some("closed".into());
        args.timeout = Some(1);

        let outcome = check(&ctx, &args).unwrap();
        assert!(outcome.is_failure());

        let store = ctx.open_store("http://127.0.0.1:1/", Some("closed")).unwrap();
        assert_eq!(store.current().unwrap().count, 1);
    }

    // Together these cover every minute of the week.
    fn always_quiet() -> Vec<String> {
        vec!["MON 00:00 - SUN 23:59".into(), "SUN 23:00 - MON 00:30".into()]
    }

    #[test]
    fn suppressed_check_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            config: PinguConfig::default(),
            verbosity: Verbosity::Normal,
            store_dir: Some(dir.path().to_path_buf()),
        };
        let mut args = args("http://127.0.0.1:1/");
        args.target.store_name = Some("quiet".into());
        args.ignore_period = always_quiet();

        let outcome = check(&ctx, &args).unwrap();
        assert!(matches!(outcome, CheckOutcome::Suppressed { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn suppressed_check_ignores_corrupt_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pingu-quiet-log.json");
        std::fs::write(&path, "{ not json").unwrap();
        let ctx = Context {
            config: PinguConfig::default(),
            verbosity: Verbosity::Normal,
            store_dir: Some(dir.path().to_path_buf()),
        };
        let mut args = args("http://127.0.0.1:1/");
        args.target.store_name = Some("quiet".into());
        args.ignore_period = always_quiet();

        let outcome = check(&ctx, &args).unwrap();
        assert!(matches!(outcome, CheckOutcome::Suppressed { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn invalid_window_fails_before_store_is_touched() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            config: PinguConfig::default(),
            verbosity: Verbosity::Normal,
            store_dir: Some(dir.path().to_path_buf()),
        };
        let mut args = args("http://127.0.0.1:1/");
        args.ignore_period = vec!["whenever".into()];

        assert!(check(&ctx, &args).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
