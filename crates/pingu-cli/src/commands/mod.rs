//! Subcommand implementations and the option groups they share.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use pingu_check::Verbosity;
use pingu_core::config::EmailConfig;
use pingu_core::{PinguConfig, DEFAULT_ARCHIVE_POLICY};
use pingu_notify::{EmailSettings, SmtpNotifier};
use pingu_store::{FileBackend, HistoryStore};

pub mod check;
pub mod report;

/// Settings shared by every subcommand.
pub struct Context {
    pub config: PinguConfig,
    pub verbosity: Verbosity,
    pub store_dir: Option<PathBuf>,
}

impl Context {
    /// Open the history for `url`, creating an empty one if none exists.
    pub fn open_store(&self, url: &str, name: Option<&str>) -> Result<HistoryStore<FileBackend>> {
        let store = self.config.store();
        let backend = match self.store_dir.clone().or(store.dir) {
            Some(dir) => FileBackend::open(dir)?,
            None => FileBackend::open_default()?,
        };
        let policy = store.archive_policy.unwrap_or(DEFAULT_ARCHIVE_POLICY);
        let store = HistoryStore::open(backend, url, name)
            .with_context(|| format!("failed to load history for {url}"))?;
        Ok(store.with_policy(policy))
    }
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// URL to check.
    pub url: String,

    /// History file name. Defaults to a hash of the URL.
    #[arg(short = 's', long)]
    pub store_name: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
#[command(next_help_heading = "Email options")]
pub struct EmailArgs {
    /// Send email. Required for any email to go out.
    #[arg(short = 'S', long = "email")]
    pub email: bool,

    /// Domain or IP of the SMTP host.
    #[arg(short = 'H', long)]
    pub email_host: Option<String>,

    /// Port of the SMTP host [default: 25].
    #[arg(short = 'p', long)]
    pub email_port: Option<u16>,

    #[arg(short = 'U', long)]
    pub email_user: Option<String>,

    #[arg(short = 'P', long)]
    pub email_password: Option<String>,

    #[arg(long)]
    pub email_from: Option<String>,

    /// One or more addresses separated by semicolons.
    #[arg(long)]
    pub email_to: Option<String>,

    /// One or more addresses separated by semicolons.
    #[arg(long)]
    pub email_cc: Option<String>,
}

impl EmailArgs {
    /// Overlay these flags on the file's `[email]` section.
    pub fn merge(&self, file: EmailConfig) -> EmailConfig {
        EmailConfig {
            enabled: Some(self.email || file.enabled.unwrap_or(false)),
            host: self.email_host.clone().or(file.host),
            port: self.email_port.or(file.port),
            user: self.email_user.clone().or(file.user),
            password: self.email_password.clone().or(file.password),
            from: self.email_from.clone().or(file.from),
            to: self.email_to.clone().or(file.to),
            cc: self.email_cc.clone().or(file.cc),
        }
    }

    /// A notifier when email is enabled, validated before any work is done.
    pub fn notifier(&self, file: EmailConfig) -> Result<Option<SmtpNotifier>> {
        let merged = self.merge(file);
        if !merged.enabled.unwrap_or(false) {
            return Ok(None);
        }
        let settings = EmailSettings::from_config(&merged).context("invalid email configuration")?;
        Ok(Some(SmtpNotifier::new(settings)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pingu_core::config::StoreConfig;
    use pingu_core::{ArchivePolicy, Status};

    fn file_email() -> EmailConfig {
        EmailConfig {
            enabled: Some(false),
            host: Some("file.example.com".into()),
            port: Some(2525),
            user: None,
            password: None,
            from: Some("pingu@example.com".into()),
            to: Some("ops@example.com".into()),
            cc: None,
        }
    }

    #[test]
    fn flags_override_file() {
        let args = EmailArgs {
            email: true,
            email_host: Some("flag.example.com".into()),
            ..Default::default()
        };
        let merged = args.merge(file_email());
        assert_eq!(merged.enabled, Some(true));
        assert_eq!(merged.host.as_deref(), Some("flag.example.com"));
        assert_eq!(merged.port, Some(2525));
        assert_eq!(merged.to.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn disabled_email_has_no_notifier() {
        let args = EmailArgs::default();
        assert!(args.notifier(file_email()).unwrap().is_none());
        assert!(args.notifier(EmailConfig::default()).unwrap().is_none());
    }

    #[test]
    fn enabled_email_is_validated() {
        let args = EmailArgs {
            email: true,
            ..Default::default()
        };
        assert!(args.notifier(file_email()).unwrap().is_some());

        let err = args.notifier(EmailConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("email host is required"));
    }

    #[test]
    fn open_store_uses_configured_dir_and_policy() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            config: PinguConfig {
                store: Some(StoreConfig {
                    dir: Some(dir.path().to_path_buf()),
                    archive_policy: Some(ArchivePolicy::OwnStatus),
                }),
                ..Default::default()
            },
            verbosity: Verbosity::Normal,
            store_dir: None,
        };

        let mut store = ctx.open_store("https://example.com", Some("site")).unwrap();
        assert_eq!(store.policy(), ArchivePolicy::OwnStatus);
        assert!(dir.path().join("pingu-site-log.json").is_file());

        let now = chrono::Utc::now();
        store.save(Status::Pass, "", now).unwrap();
        store.save(Status::Fail, "down", now).unwrap();
        assert_eq!(store.history().passes.len(), 1);
    }
}
