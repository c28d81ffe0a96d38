use std::process::Command;

use crate::error::PetError;

use super::{ActivityProbe, ActivitySignal};

const FRONTMOST_APP_SCRIPT: &str = r#"
tell application "System Events"
    set frontApp to name of first application process whose frontmost is true
    return frontApp
end tell
"#;

const CHROME_TAB_SCRIPT: &str = r#"
tell application "Google Chrome"
    if (count of windows) = 0 then return ""
    set currentTab to active tab of front window
    return (URL of currentTab) & " ||| " & (title of currentTab)
end tell
"#;

const SAFARI_TAB_SCRIPT: &str = r#"
tell application "Safari"
    if (count of windows) = 0 then return ""
    return (URL of front document) & " ||| " & (name of front document)
end tell
"#;

/// Queries the frontmost application (and, for known browsers, the active
/// tab) through AppleScript. Each call is a short-lived subprocess; errors
/// and timeouts surface as `ActivityQueryUnavailable`.
pub struct OsaScriptProbe;

impl OsaScriptProbe {
    pub fn new() -> Self {
        Self
    }

    fn run_script(script: &str) -> Result<String, PetError> {
        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .output()
            .map_err(|err| PetError::ActivityQueryUnavailable(err.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PetError::ActivityQueryUnavailable(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn active_tab(app_name: &str) -> Option<(String, String)> {
        let script = if app_name.contains("chrome") {
            CHROME_TAB_SCRIPT
        } else if app_name.contains("safari") {
            SAFARI_TAB_SCRIPT
        } else {
            return None;
        };

        let raw = Self::run_script(script).ok()?;
        let (url, title) = raw.split_once(" ||| ")?;
        if url.is_empty() {
            return None;
        }
        Some((url.to_string(), title.to_string()))
    }
}

impl Default for OsaScriptProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityProbe for OsaScriptProbe {
    #[cfg(target_os = "macos")]
    fn sample(&self) -> Result<ActivitySignal, PetError> {
        let app_name = Self::run_script(FRONTMOST_APP_SCRIPT)?.to_lowercase();
        if app_name.is_empty() {
            return Err(PetError::ActivityQueryUnavailable(
                "empty frontmost application name".into(),
            ));
        }

        // Tab lookup is best-effort: a browser with no readable tab still
        // classifies as browsing_other downstream.
        let (url, title) = match Self::active_tab(&app_name) {
            Some((url, title)) => (Some(url), Some(title)),
            None => (None, None),
        };

        Ok(ActivitySignal { app_name, url, title })
    }

    #[cfg(not(target_os = "macos"))]
    fn sample(&self) -> Result<ActivitySignal, PetError> {
        Err(PetError::ActivityQueryUnavailable(
            "foreground query is only implemented for macOS".into(),
        ))
    }
}
