use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, timeout, Duration, Instant, MissedTickBehavior};

use crate::classifier::classify;
use crate::engine::EventKind;
use crate::notify;

use super::ControllerInner;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const ACTIVITY_INTERVAL_SECS: u64 = 3;
pub const ECONOMY_INTERVAL_SECS: u64 = 60;
pub const HEALTH_INTERVAL_SECS: u64 = 30;
pub const SYNC_INTERVAL_SECS: u64 = 120;
const PROBE_TIMEOUT_SECS: u64 = 5;
const PUSH_TIMEOUT_SECS: u64 = 10;

/// Health thresholds for the two nag levels.
const HEALTH_CRITICAL_BELOW: f64 = 30.0;
const HEALTH_WARNING_BELOW: f64 = 50.0;

/// ~3s cadence: probe → classify → stat/streak/time accounting → persist.
/// A failed or timed-out probe skips the tick and leaves state unchanged.
pub async fn activity_loop(inner: Arc<ControllerInner>) {
    let mut ticker = interval(Duration::from_secs(ACTIVITY_INTERVAL_SECS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let elapsed_secs = last_tick.elapsed().as_secs_f64();
                last_tick = Instant::now();

                let probe = inner.probe.clone();
                let sample = timeout(
                    Duration::from_secs(PROBE_TIMEOUT_SECS),
                    tokio::task::spawn_blocking(move || probe.sample()),
                )
                .await;

                let signal = match sample {
                    Ok(Ok(Ok(signal))) => signal,
                    Ok(Ok(Err(err))) => {
                        log_warn!("activity query unavailable, skipping tick: {err}");
                        continue;
                    }
                    Ok(Err(join_err)) => {
                        log_error!("activity probe worker failed: {join_err:?}");
                        continue;
                    }
                    Err(_) => {
                        log_warn!("activity probe timeout (> {PROBE_TIMEOUT_SECS}s), skipping tick");
                        continue;
                    }
                };

                let rules = inner.rules.current();
                let classification = classify(&signal, &rules);
                let events = {
                    let mut session = inner.session.lock().await;
                    session.apply_sample(&classification, elapsed_secs, &rules)
                };

                inner.dispatch_events(&events).await;
                inner.persist().await;
            }
            _ = inner.cancel.cancelled() => {
                log_info!("activity loop shutting down");
                break;
            }
        }
    }
}

/// ~60s cadence: settle dumpling earnings against the ledger's own elapsed
/// time, never the activity loop's.
pub async fn economy_loop(inner: Arc<ControllerInner>) {
    let mut ticker = interval(Duration::from_secs(ECONOMY_INTERVAL_SECS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let rules = inner.rules.current();
                let events = {
                    let mut session = inner.session.lock().await;
                    session.settle_economy(&rules, Utc::now())
                };

                inner.dispatch_events(&events).await;
                inner.persist().await;
            }
            _ = inner.cancel.cancelled() => {
                log_info!("economy loop shutting down");
                break;
            }
        }
    }
}

/// ~30s cadence: health/break nags plus the running day-rollover check.
pub async fn health_loop(inner: Arc<ControllerInner>) {
    let mut ticker = interval(Duration::from_secs(HEALTH_INTERVAL_SECS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                let tuning = inner.rules.tuning();

                let (health, break_mins, rolled) = {
                    let mut session = inner.session.lock().await;
                    let rolled = session.rollover_if_new_day(now);
                    let break_mins = if session.break_due(&tuning) {
                        Some(session.productive_secs_since_break / 60.0)
                    } else {
                        None
                    };
                    (session.stats.health, break_mins, rolled)
                };

                if let Some(summary) = rolled {
                    log_info!(
                        "day rollover: {} earned {:.1} dumplings over {:.0} productive minutes",
                        summary.date,
                        summary.session_earned,
                        summary.productive_secs / 60.0
                    );
                    if let Err(err) = inner.db.insert_day_summary(&summary).await {
                        log_error!("failed to record day summary: {err:?}");
                    }
                    inner.persist().await;
                }

                if health < HEALTH_CRITICAL_BELOW {
                    inner
                        .gate_and_send(EventKind::HealthCritical, notify::health_critical(health))
                        .await;
                } else if health < HEALTH_WARNING_BELOW {
                    inner
                        .gate_and_send(EventKind::HealthWarning, notify::health_warning(health))
                        .await;
                }

                if let Some(mins) = break_mins {
                    inner
                        .gate_and_send(EventKind::BreakDue, notify::break_due(mins))
                        .await;
                }
            }
            _ = inner.cancel.cancelled() => {
                log_info!("health loop shutting down");
                break;
            }
        }
    }
}

/// ~120s cadence: publish our status and look for peers that overtook us.
/// Everything here is best-effort; a failure logs and the session continues
/// local-only.
pub async fn sync_loop(inner: Arc<ControllerInner>) {
    let Some(leaderboard) = inner.leaderboard.clone() else {
        log_info!("no leaderboard configured; remote sync disabled");
        return;
    };

    let mut ticker = interval(Duration::from_secs(SYNC_INTERVAL_SECS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let update = inner.status_update().await;
                let session_earned = update.session_earned;

                match timeout(
                    Duration::from_secs(PUSH_TIMEOUT_SECS),
                    leaderboard.push_status(&update),
                )
                .await
                {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        log_warn!("leaderboard push failed, continuing local-only: {err}");
                        continue;
                    }
                    Err(_) => {
                        log_warn!("leaderboard push timeout (> {PUSH_TIMEOUT_SECS}s)");
                        continue;
                    }
                }

                let peers = match timeout(
                    Duration::from_secs(PUSH_TIMEOUT_SECS),
                    leaderboard.fetch_peers(&inner.identity.user_id),
                )
                .await
                {
                    Ok(Ok(peers)) => peers,
                    Ok(Err(err)) => {
                        log_warn!("peer fetch failed: {err}");
                        continue;
                    }
                    Err(_) => continue,
                };

                let tuning = inner.rules.tuning();
                let now = Utc::now();
                let (rank, field) = crate::remote::compute_rank(&peers, session_earned);
                log_info!("leaderboard: #{rank} of {field} with {session_earned:.1} today");

                if let Some(peer) = crate::remote::find_overtaker(
                    &peers,
                    session_earned,
                    tuning.overtake_margin,
                    tuning.peer_active_window_secs,
                    now,
                ) {
                    let gap = peer.session_earned - session_earned;
                    inner
                        .gate_and_send(
                            EventKind::SocialOvertaken,
                            notify::overtaken(&peer.username, gap),
                        )
                        .await;
                }
            }
            _ = inner.cancel.cancelled() => {
                log_info!("sync loop shutting down");
                break;
            }
        }
    }
}
