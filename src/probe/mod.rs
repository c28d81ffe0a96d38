//! Foreground activity probe.
//!
//! The engine never queries the OS directly; it consumes this capability so
//! the sampler loop can be exercised in tests with a scripted probe. The
//! default implementation shells out to `osascript` on macOS.

use crate::error::PetError;

pub mod macos;

pub use macos::OsaScriptProbe;

/// One raw observation of what the user has in the foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySignal {
    pub app_name: String,
    pub url: Option<String>,
    pub title: Option<String>,
}

impl ActivitySignal {
    pub fn app(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            url: None,
            title: None,
        }
    }

    pub fn browser(
        app_name: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            url: Some(url.into()),
            title: Some(title.into()),
        }
    }
}

/// Blocking query for the current foreground activity. The sampler loop runs
/// it on the blocking pool under a timeout; a failure is a skipped tick, not
/// a crash.
pub trait ActivityProbe: Send + Sync {
    fn sample(&self) -> Result<ActivitySignal, PetError>;
}
