//! Outbound notification intent.
//!
//! The engine decides *whether* to notify (see `engine::policy`); this module
//! owns *how*. Dispatch is fire-and-forget: a failed `osascript` call is
//! logged and forgotten.

use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use rand::seq::SliceRandom;

/// A notification ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub subtitle: String,
    pub body: String,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            body: body.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Native macOS notifications via `osascript display notification`. Can be
/// muted at runtime without restarting the loops.
pub struct OsaScriptNotifier {
    enabled: AtomicBool,
}

impl OsaScriptNotifier {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

impl Default for OsaScriptNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for OsaScriptNotifier {
    fn notify(&self, notification: &Notification) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }

        let script = format!(
            "display notification \"{}\" with title \"{}\" subtitle \"{}\"",
            escape(&notification.body),
            escape(&notification.title),
            escape(&notification.subtitle),
        );

        match Command::new("osascript").arg("-e").arg(script).status() {
            Ok(status) if status.success() => {
                debug!("dispatched notification: {}", notification.title);
            }
            Ok(status) => warn!("osascript exited with {status} for '{}'", notification.title),
            Err(err) => warn!("failed to dispatch '{}': {err}", notification.title),
        }
    }
}

/// Fallback used off-macOS and in tests: notifications go to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        log::info!(
            "[notify] {} | {} | {}",
            notification.title,
            notification.subtitle,
            notification.body
        );
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

// ── Message builders ─────────────────────────────────────────────────

pub fn health_critical(health: f64) -> Notification {
    Notification::new(
        "🚨 Health Critical!",
        format!("Health: {health:.0}% - distraction overload!"),
        "Close the distracting tabs and let your dino recover.",
    )
}

pub fn health_warning(health: f64) -> Notification {
    Notification::new(
        "⚠️ Dino Needs Care",
        format!("Health is down to {health:.0}%"),
        "A feed or a short break would help.",
    )
}

pub fn break_due(productive_mins: f64) -> Notification {
    Notification::new(
        "🧘 Break Time!",
        format!("{productive_mins:.0} minutes of focused work"),
        "Time to stretch, rest your eyes, and recharge.",
    )
}

pub fn milestone(threshold: u64, balance: f64) -> Notification {
    Notification::new(
        "🎉 Milestone Reached!",
        format!("🥟 {threshold} total dumplings earned!"),
        format!("Current balance: {balance:.0} dumplings. Keep it up!"),
    )
}

pub fn daily_goal(earned: f64) -> Notification {
    Notification::new(
        "🏅 Daily Goal Hit!",
        format!("🥟 {earned:.0} dumplings earned today"),
        "Your dino is proud of you.",
    )
}

pub fn coding_celebration(secs: f64) -> Notification {
    Notification::new(
        "🔥 Coding Streak!",
        format!("{:.0} minutes of uninterrupted coding", secs / 60.0),
        "You're on fire! Dumplings are flowing.",
    )
}

pub fn social_binge(secs: f64) -> Notification {
    Notification::new(
        "📱 Social Media Alert!",
        format!("{:.0} minutes of scrolling", secs / 60.0),
        "🥟 Losing dumplings! Your dino suggests a break.",
    )
}

pub fn website_changed(domain: &str, category_label: &str) -> Notification {
    Notification::new(
        "🌐 Website Change",
        format!("Now on: {domain}"),
        format!("Category: {category_label}"),
    )
}

pub fn overtaken(username: &str, gap: f64) -> Notification {
    let messages = [
        format!("🚀 {username} is crushing it with {gap:.0} more dumplings!"),
        format!("💪 Time to step up! {username} is {gap:.0} ahead!"),
        format!("🔥 {username} is on fire! Can you catch up?"),
    ];
    let body = messages
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_default();
    Notification::new("🏆 Competition Alert!", format!("{username} passed you"), body)
}

pub fn welcome(username: &str, balance: f64) -> Notification {
    Notification::new(
        "🦕 Dino Companion Started!",
        format!("Welcome back, {username}! 🥟 {balance:.0} dumplings"),
        "Ready to be productive with your dino friend!",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osascript_payloads_are_escaped() {
        assert_eq!(escape(r#"say "hi""#), r#"say \"hi\""#);
    }

    #[test]
    fn overtaken_message_mentions_the_peer() {
        let n = overtaken("Dino_ava", 12.0);
        assert!(n.subtitle.contains("Dino_ava"));
        assert!(n.body.contains("Dino_ava") || n.body.contains("12"));
    }
}
