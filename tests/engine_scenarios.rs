//! End-to-end engine scenarios: classifier → session → economy, no I/O.

use chrono::{Duration, Utc};

use dinopet_lib::classifier::classify;
use dinopet_lib::config::{RulesConfig, Tuning};
use dinopet_lib::engine::{EventKind, NotificationPolicy};
use dinopet_lib::probe::ActivitySignal;
use dinopet_lib::session::{PetEvent, Session};
use dinopet_lib::taxonomy::Category;

fn tick(session: &mut Session, signal: &ActivitySignal, secs: f64, rules: &RulesConfig) {
    let classification = classify(signal, rules);
    session.apply_sample(&classification, secs, rules);
}

#[test]
fn a_morning_of_coding_pays_out() {
    let rules = RulesConfig::default();
    let now = Utc::now();
    let mut session = Session::new(now);
    session.stats.health = 50.0;

    let editor = ActivitySignal::app("cursor");

    // Five minutes of 3s samples.
    for _ in 0..100 {
        tick(&mut session, &editor, 3.0, &rules);
    }
    assert_eq!(session.current_category, Category::Coding);
    assert_eq!(session.time_spent.get("coding"), Some(&300.0));

    // Stats drifted up but stayed bounded.
    assert!(session.stats.in_bounds());

    // Health climbed past 80 during those five minutes (+1 per tick from 50),
    // so force it back into the no-bonus band before settlement to pin down
    // the arithmetic: +2.0/min * 5min with no multipliers.
    session.stats.health = 50.0;
    session.settle_economy(&rules, now + Duration::minutes(5));
    assert_eq!(session.ledger.session_earned, 10.0);
    assert_eq!(session.ledger.balance, 10.0);
    assert_eq!(session.ledger.total_earned, 10.0);
}

#[test]
fn doomscrolling_drains_but_never_overdrafts() {
    let rules = RulesConfig::default();
    let now = Utc::now();
    let mut session = Session::new(now);
    session.ledger.balance = 1.0;

    let feed = ActivitySignal::browser("chrome", "https://x.com/home", "Home / X");
    tick(&mut session, &feed, 3.0, &rules);

    session.settle_economy(&rules, now + Duration::minutes(10));
    assert_eq!(session.ledger.balance, 0.0);
    assert_eq!(session.ledger.total_earned, 0.0);
    // Another settlement with an empty balance changes nothing.
    session.settle_economy(&rules, now + Duration::minutes(20));
    assert_eq!(session.ledger.balance, 0.0);
}

#[test]
fn override_rewrites_a_builtin_domain() {
    let mut rules = RulesConfig::default();
    rules
        .overrides
        .insert("github.com".into(), Category::Social);

    let signal = ActivitySignal::browser("chrome", "https://github.com/pulls", "Pull requests");
    let got = classify(&signal, &rules);
    assert_eq!(got.category, Category::Social);
}

#[test]
fn streak_survives_only_unbroken_runs() {
    let rules = RulesConfig::default();
    let mut session = Session::new(Utc::now());

    let editor = ActivitySignal::app("vim");
    let social = ActivitySignal::browser("chrome", "https://reddit.com/r/all", "reddit");

    tick(&mut session, &editor, 10.0, &rules);
    tick(&mut session, &editor, 10.0, &rules);
    assert_eq!(session.streaks.coding_secs, 20.0);

    tick(&mut session, &social, 10.0, &rules);
    assert_eq!(session.streaks.coding_secs, 0.0);

    tick(&mut session, &editor, 10.0, &rules);
    assert_eq!(session.streaks.coding_secs, 10.0);
}

#[test]
fn coding_streak_bonus_multiplies_earnings() {
    let rules = RulesConfig::default();
    let now = Utc::now();
    let mut session = Session::new(now);
    session.stats.health = 50.0;

    let editor = ActivitySignal::app("vim");
    // 35 minutes of unbroken coding: past the 30-minute bonus threshold,
    // short of the 60-minute celebration reset.
    for _ in 0..700 {
        tick(&mut session, &editor, 3.0, &rules);
    }
    assert!(session.streaks.coding_secs > 1800.0);

    session.stats.health = 50.0;
    session.settle_economy(&rules, now + Duration::minutes(10));
    // 2.0/min * 10min * 1.5 streak bonus.
    assert!((session.ledger.session_earned - 30.0).abs() < 1e-9);
}

#[test]
fn milestones_fire_once_across_days() {
    let rules = RulesConfig::default();
    let now = Utc::now();
    let mut session = Session::new(now);
    session.stats.health = 50.0;

    let editor = ActivitySignal::app("vim");
    tick(&mut session, &editor, 3.0, &rules);

    // Day one: earn 60, crossing 10/25/50.
    let events = session.settle_economy(&rules, now + Duration::minutes(30));
    let day_one: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            PetEvent::Milestone { threshold } => Some(*threshold),
            _ => None,
        })
        .collect();
    assert_eq!(day_one, vec![10, 25, 50]);

    // Roll into day two and earn past 50 again within the new session.
    let tomorrow = now + Duration::days(1);
    assert!(session.rollover_if_new_day(tomorrow).is_some());
    assert_eq!(session.ledger.session_earned, 0.0);

    tick(&mut session, &editor, 3.0, &rules);
    let events = session.settle_economy(&rules, tomorrow + Duration::minutes(30));
    let day_two: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            PetEvent::Milestone { threshold } => Some(*threshold),
            _ => None,
        })
        .collect();
    // 50 does not refire; the lifetime total moved on to 100.
    assert_eq!(day_two, vec![100]);
}

#[test]
fn health_critical_notifications_respect_the_throttle() {
    let policy = NotificationPolicy::default();
    let mut session = Session::new(Utc::now());
    session.stats.health = 20.0;

    let t0 = Utc::now();
    let mut permitted = 0;
    for minutes in [0, 2] {
        let at = t0 + Duration::minutes(minutes);
        if policy.should_notify(EventKind::HealthCritical, &session.last_fired, at) {
            policy.record_fired(EventKind::HealthCritical, &mut session.last_fired, at);
            permitted += 1;
        }
    }
    assert_eq!(permitted, 1);
}

#[test]
fn break_action_restores_and_resets() {
    let rules = RulesConfig::default();
    let tuning = Tuning::default();
    let mut session = Session::new(Utc::now());

    let editor = ActivitySignal::app("vim");
    for _ in 0..1000 {
        tick(&mut session, &editor, 3.0, &rules);
    }
    assert!(session.break_due(&tuning));

    session.take_break(&tuning);
    assert!(!session.break_due(&tuning));
    assert_eq!(session.ledger.balance, 3.0);
}

#[test]
fn stats_hold_bounds_through_a_chaotic_day() {
    let rules = RulesConfig::default();
    let mut session = Session::new(Utc::now());

    let signals = [
        ActivitySignal::app("cursor"),
        ActivitySignal::browser("chrome", "https://youtube.com/feed", "YouTube"),
        ActivitySignal::app("Preview"),
        ActivitySignal::browser("chrome", "https://x.com/home", "X"),
        ActivitySignal::app("figma"),
    ];

    for i in 0..5000 {
        let signal = &signals[i % signals.len()];
        tick(&mut session, signal, 3.0, &rules);
        assert!(session.stats.in_bounds(), "stats escaped bounds at tick {i}");
        assert!(session.ledger.balance >= 0.0);
    }
}
