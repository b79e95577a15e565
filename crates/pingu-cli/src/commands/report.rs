//! `pingu report` prints a URL's history and optionally emails it.

use anyhow::{Context as _, Result};
use clap::Args;
use pingu_notify::{EmailMessage, Notifier, Report};
use tracing::info;

use super::{Context, EmailArgs, TargetArgs};

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub email: EmailArgs,
}

pub fn load_report(ctx: &Context, target: &TargetArgs) -> Result<Report> {
    let store = ctx.open_store(&target.url, target.store_name.as_deref())?;
    Ok(Report::from_history(store.history()))
}

pub fn report(ctx: &Context, args: &ReportArgs) -> Result<()> {
    let notifier = args.email.notifier(ctx.config.email())?;
    let report = load_report(ctx, &args.target)?;
    print!("{}", report.to_text());

    if let Some(notifier) = notifier {
        info!(url = %report.url, "sending report email");
        notifier
            .send(&EmailMessage::report(&report))
            .context("failed to send report email")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pingu_check::Verbosity;
    use pingu_core::{PinguConfig, Status};

    #[test]
    fn report_reflects_saved_history() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            config: PinguConfig::default(),
            verbosity: Verbosity::Normal,
            store_dir: Some(dir.path().to_path_buf()),
        };
        let target = TargetArgs {
            url: "https://example.com".into(),
            store_name: None,
        };

        let start = Utc.with_ymd_and_hms(2024, 1, 6, 10, 0, 0).unwrap();
        let mut store = ctx.open_store(&target.url, None).unwrap();
        store.save(Status::Fail, "down", start).unwrap();
        store.save(Status::Fail, "down", start + Duration::minutes(90)).unwrap();
        store.save(Status::Pass, "", start + Duration::minutes(95)).unwrap();

        let report = load_report(&ctx, &target).unwrap();
        assert_eq!(
            report.current.as_deref(),
            Some("2024-01-06 11:35:00 PASSING 1 checks for .")
        );
        assert_eq!(
            report.history,
            ["2024-01-06 11:30:00 FAILING 2 checks for 1 hour and 30 minutes."]
        );
    }

    #[test]
    fn report_for_unknown_url_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            config: PinguConfig::default(),
            verbosity: Verbosity::Normal,
            store_dir: Some(dir.path().to_path_buf()),
        };
        let args = ReportArgs {
            target: TargetArgs {
                url: "https://never-checked.example.com".into(),
                store_name: None,
            },
            email: Default::default(),
        };

        assert!(report(&ctx, &args).is_ok());
        let report = load_report(&ctx, &args.target).unwrap();
        assert!(report.current.is_none());
        assert!(report.history.is_empty());
    }
}
