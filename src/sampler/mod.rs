use std::sync::Arc;

use chrono::Utc;
use tokio::{sync::Mutex, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{
    config::RulesStore,
    db::Database,
    engine::{EventKind, NotificationPolicy},
    error::PetError,
    identity::Identity,
    notify::{self, Notification, Notifier},
    probe::ActivityProbe,
    remote::{LeaderboardClient, StatusUpdate},
    session::{PetEvent, Session},
    taxonomy::{Category, DinoState},
};

mod loops;

pub use loops::{
    ACTIVITY_INTERVAL_SECS, ECONOMY_INTERVAL_SECS, HEALTH_INTERVAL_SECS, SYNC_INTERVAL_SECS,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

const FEED_DISPLAY_SECS: u64 = 3;
const PET_DISPLAY_SECS: u64 = 2;

/// Transient display state (eating/excited) with its scheduled revert task.
/// Kept apart from the session so the displayed flourish can never corrupt
/// the authoritative category the economy runs on.
struct Transient {
    state: DinoState,
    revert: JoinHandle<()>,
}

/// Shared state for all sampler tasks. One lock guards the whole aggregate:
/// stat and economy deltas do not commute with clamping, so two tasks must
/// never apply them concurrently.
pub(crate) struct ControllerInner {
    pub(crate) session: Mutex<Session>,
    pub(crate) db: Database,
    pub(crate) rules: Arc<RulesStore>,
    pub(crate) policy: NotificationPolicy,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) probe: Arc<dyn ActivityProbe>,
    pub(crate) leaderboard: Option<Arc<LeaderboardClient>>,
    pub(crate) identity: Identity,
    pub(crate) cancel: CancellationToken,
    transient: Mutex<Option<Transient>>,
}

impl ControllerInner {
    /// Run a candidate notification through the throttle; dispatch and record
    /// only if permitted.
    pub(crate) async fn gate_and_send(&self, kind: EventKind, notification: Notification) {
        let now = Utc::now();
        {
            let mut session = self.session.lock().await;
            if !self.policy.should_notify(kind, &session.last_fired, now) {
                return;
            }
            self.policy.record_fired(kind, &mut session.last_fired, now);
        }
        self.notifier.notify(&notification);
    }

    /// Translate tick events into notifications and gate each one.
    pub(crate) async fn dispatch_events(&self, events: &[PetEvent]) {
        for event in events {
            let (kind, notification) = {
                let session = self.session.lock().await;
                match event {
                    PetEvent::WebsiteChanged { domain, category } => (
                        EventKind::WebsiteChanged,
                        notify::website_changed(domain, category.as_str()),
                    ),
                    PetEvent::CodingCelebration { secs } => {
                        (EventKind::CodingStreak, notify::coding_celebration(*secs))
                    }
                    PetEvent::SocialBinge { secs } => {
                        (EventKind::SocialStreak, notify::social_binge(*secs))
                    }
                    PetEvent::Milestone { threshold } => (
                        EventKind::Milestone,
                        notify::milestone(*threshold, session.ledger.balance),
                    ),
                    PetEvent::DailyGoal { earned } => {
                        (EventKind::DailyGoal, notify::daily_goal(*earned))
                    }
                }
            };
            self.gate_and_send(kind, notification).await;
        }
    }

    /// Write the full aggregate. A failed write is logged and retried on the
    /// next state-changing tick; the loop never blocks on it.
    pub(crate) async fn persist(&self) {
        let snapshot = self.session.lock().await.clone();
        if let Err(err) = self.db.save_snapshot(&snapshot).await {
            log_error!(
                "{}",
                PetError::PersistenceWriteFailed(format!("{err:?}"))
            );
        }
    }

    pub(crate) async fn status_update(&self) -> StatusUpdate {
        let session = self.session.lock().await;
        let display = self.display_of(&session).await;
        StatusUpdate {
            user_id: self.identity.user_id.clone(),
            username: self.identity.username.clone(),
            balance: session.ledger.balance,
            total_earned: session.ledger.total_earned,
            session_earned: session.ledger.session_earned,
            health: session.stats.health,
            current_state: display.key().to_string(),
            productive_secs_today: session.productive_secs_today,
            last_activity: Utc::now(),
        }
    }

    async fn display_of(&self, session: &Session) -> DinoState {
        if let Some(transient) = self.transient.lock().await.as_ref() {
            return transient.state;
        }
        session.display()
    }
}

/// Public view of the pet for whatever front end sits on top.
#[derive(Debug, Clone)]
pub struct PetSnapshot {
    pub state: DinoState,
    pub category: Category,
    pub health: f64,
    pub happiness: f64,
    pub energy: f64,
    pub balance: f64,
    pub session_earned: f64,
    pub total_earned: f64,
}

/// Owns the session and the cadenced sampler tasks. Cheap to clone; all
/// clones share the same state.
#[derive(Clone)]
pub struct PetController {
    inner: Arc<ControllerInner>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl PetController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: Session,
        db: Database,
        rules: Arc<RulesStore>,
        notifier: Arc<dyn Notifier>,
        probe: Arc<dyn ActivityProbe>,
        leaderboard: Option<Arc<LeaderboardClient>>,
        identity: Identity,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                session: Mutex::new(session),
                db,
                rules,
                policy: NotificationPolicy::default(),
                notifier,
                probe,
                leaderboard,
                identity,
                cancel: CancellationToken::new(),
                transient: Mutex::new(None),
            }),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Spawn the cadenced tasks. Each one reschedules itself until shutdown;
    /// there is no mid-tick cancellation.
    pub async fn start(&self) {
        let mut tasks = self.tasks.lock().await;
        tasks.push(tokio::spawn(loops::activity_loop(self.inner.clone())));
        tasks.push(tokio::spawn(loops::economy_loop(self.inner.clone())));
        tasks.push(tokio::spawn(loops::health_loop(self.inner.clone())));
        tasks.push(tokio::spawn(loops::sync_loop(self.inner.clone())));
        log_info!("sampler loops started");
    }

    /// Cancel the loops, wait for them to finish their current tick, and
    /// write a final snapshot.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut tasks = self.tasks.lock().await;
        for handle in tasks.drain(..) {
            let _ = handle.await;
        }
        self.inner.persist().await;
        log_info!("sampler shut down");
    }

    pub async fn snapshot(&self) -> PetSnapshot {
        let session = self.inner.session.lock().await;
        let state = self.inner.display_of(&session).await;
        PetSnapshot {
            state,
            category: session.current_category,
            health: session.stats.health,
            happiness: session.stats.happiness,
            energy: session.stats.energy,
            balance: session.ledger.balance,
            session_earned: session.ledger.session_earned,
            total_earned: session.ledger.total_earned,
        }
    }

    /// Feed the dino. Rejects with `InsufficientFunds` (no state change) when
    /// the balance does not cover the cost.
    pub async fn feed(&self) -> Result<(), PetError> {
        let tuning = self.inner.rules.tuning();
        {
            let mut session = self.inner.session.lock().await;
            session.feed(&tuning)?;
        }
        self.set_transient(DinoState::Eating, FEED_DISPLAY_SECS).await;
        self.inner.persist().await;
        self.inner.notifier.notify(&Notification::new(
            "🥟 Nom Nom!",
            "Your dino enjoyed the meal!",
            "Health +15 | Happiness +20",
        ));
        Ok(())
    }

    pub async fn pet(&self) {
        {
            let mut session = self.inner.session.lock().await;
            session.pet();
        }
        self.set_transient(DinoState::Excited, PET_DISPLAY_SECS).await;
        self.inner.persist().await;
    }

    pub async fn take_break(&self) {
        let tuning = self.inner.rules.tuning();
        let events = {
            let mut session = self.inner.session.lock().await;
            session.take_break(&tuning)
        };
        self.inner.dispatch_events(&events).await;
        self.inner.persist().await;
    }

    /// Replace the transient display state, aborting a pending revert so the
    /// newest action wins.
    async fn set_transient(&self, state: DinoState, secs: u64) {
        let inner = self.inner.clone();
        let revert = tokio::spawn(async move {
            time::sleep(time::Duration::from_secs(secs)).await;
            inner.transient.lock().await.take();
        });

        let mut guard = self.inner.transient.lock().await;
        if let Some(previous) = guard.take() {
            previous.revert.abort();
        }
        *guard = Some(Transient { state, revert });
    }
}
