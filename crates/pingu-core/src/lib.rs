pub mod backoff;
pub mod config;
pub mod error;
pub mod types;
pub mod window;

pub use backoff::{backoff, RetryIncrement};
pub use config::PinguConfig;
pub use error::{CoreError, CoreResult};
pub use types::*;
pub use window::{in_window, DayAnchor, InvalidWindowPolicy, QuietWindow, QuietWindows};
