//! Failure alerts and history reports for pingu.
//!
//! [`message`] renders plain-text content from a check history; [`email`]
//! validates address settings and delivers messages through a [`Notifier`].

pub mod email;
pub mod error;
pub mod message;

pub use email::{parse_addresses, EmailMessage, EmailSettings, Notifier, SmtpNotifier};
pub use error::{NotifyError, NotifyResult};
pub use message::{alert_body, alert_subject, duration_string, episode_summary, Report};
