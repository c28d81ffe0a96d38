//! Best-effort leaderboard sync.
//!
//! Pushes are at-most-once and fire-and-forget: a dropped or failed push is
//! logged and never retried in a way that could double-count local earnings.
//! The rank/overtaken helpers are pure so the social notification flow is
//! testable without a server.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PetError;

/// What we publish about ourselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub user_id: String,
    pub username: String,
    pub balance: f64,
    pub total_earned: f64,
    pub session_earned: f64,
    pub health: f64,
    pub current_state: String,
    pub productive_secs_today: f64,
    pub last_activity: DateTime<Utc>,
}

/// What the backend tells us about everyone else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerStatus {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub session_earned: f64,
    #[serde(default)]
    pub total_earned: f64,
    #[serde(default)]
    pub current_state: Option<String>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl PeerStatus {
    /// Peers go quiet after half an hour without a status update.
    pub fn is_active(&self, now: DateTime<Utc>, window_secs: i64) -> bool {
        match self.last_activity {
            Some(at) => now.signed_duration_since(at) < Duration::seconds(window_secs),
            None => false,
        }
    }
}

/// Session-earnings rank among peers plus self, 1-based.
pub fn compute_rank(peers: &[PeerStatus], my_session_earned: f64) -> (usize, usize) {
    let ahead = peers
        .iter()
        .filter(|p| p.session_earned > my_session_earned)
        .count();
    (ahead + 1, peers.len() + 1)
}

/// The most recently active peer who is ahead of us by at least `margin`.
/// Feeds the social-overtaken notification; the throttle lives in the policy.
pub fn find_overtaker<'a>(
    peers: &'a [PeerStatus],
    my_session_earned: f64,
    margin: f64,
    active_window_secs: i64,
    now: DateTime<Utc>,
) -> Option<&'a PeerStatus> {
    peers
        .iter()
        .filter(|p| p.is_active(now, active_window_secs))
        .filter(|p| p.session_earned - my_session_earned >= margin)
        .max_by(|a, b| {
            a.session_earned
                .partial_cmp(&b.session_earned)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Thin HTTP client for the leaderboard backend. JSON in, JSON out; every
/// failure is a `RemoteSyncFailed` and the caller keeps going local-only.
pub struct LeaderboardClient {
    base_url: String,
    client: reqwest::Client,
}

impl LeaderboardClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn push_status(&self, update: &StatusUpdate) -> Result<(), PetError> {
        let url = format!("{}/status/{}", self.base_url, update.user_id);
        self.client
            .put(&url)
            .json(update)
            .send()
            .await
            .map_err(|err| PetError::RemoteSyncFailed(err.to_string()))?
            .error_for_status()
            .map_err(|err| PetError::RemoteSyncFailed(err.to_string()))?;
        Ok(())
    }

    pub async fn fetch_peers(&self, user_id: &str) -> Result<Vec<PeerStatus>, PetError> {
        let url = format!("{}/peers?exclude={}", self.base_url, user_id);
        let peers = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| PetError::RemoteSyncFailed(err.to_string()))?
            .error_for_status()
            .map_err(|err| PetError::RemoteSyncFailed(err.to_string()))?
            .json::<Vec<PeerStatus>>()
            .await
            .map_err(|err| PetError::RemoteSyncFailed(err.to_string()))?;
        Ok(peers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(name: &str, session: f64, active_mins_ago: i64) -> PeerStatus {
        PeerStatus {
            user_id: name.to_lowercase(),
            username: name.to_string(),
            session_earned: session,
            total_earned: session,
            current_state: Some("coding".into()),
            last_activity: Some(Utc::now() - Duration::minutes(active_mins_ago)),
        }
    }

    #[test]
    fn rank_counts_peers_ahead() {
        let peers = vec![peer("a", 50.0, 1), peer("b", 10.0, 1), peer("c", 30.0, 1)];
        assert_eq!(compute_rank(&peers, 20.0), (3, 4));
        assert_eq!(compute_rank(&peers, 60.0), (1, 4));
        assert_eq!(compute_rank(&[], 0.0), (1, 1));
    }

    #[test]
    fn overtaker_requires_margin_and_recency() {
        let peers = vec![
            peer("close", 24.0, 1),   // ahead but under the margin
            peer("stale", 90.0, 120), // far ahead but inactive
            peer("rival", 40.0, 5),
        ];
        let got = find_overtaker(&peers, 20.0, 10.0, 1800, Utc::now()).unwrap();
        assert_eq!(got.username, "rival");
    }

    #[test]
    fn no_overtaker_when_leading() {
        let peers = vec![peer("a", 5.0, 1)];
        assert!(find_overtaker(&peers, 50.0, 10.0, 1800, Utc::now()).is_none());
    }

    #[test]
    fn peer_without_activity_timestamp_is_inactive() {
        let mut p = peer("ghost", 99.0, 0);
        p.last_activity = None;
        assert!(!p.is_active(Utc::now(), 1800));
    }
}
