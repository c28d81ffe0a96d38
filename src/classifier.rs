use url::Url;

use crate::config::RulesConfig;
use crate::probe::ActivitySignal;
use crate::taxonomy::{state_for_app_category, Category, DinoState};

/// Result of classifying one activity sample. `state` is the category-derived
/// base state; the health override (`display_state`) is applied by the caller
/// so the stored category is never affected by display concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub state: DinoState,
    /// Normalized domain when the sample came from a browser tab.
    pub domain: Option<String>,
}

impl Classification {
    fn app(category: Category) -> Self {
        Self {
            category,
            state: state_for_app_category(category),
            domain: None,
        }
    }

    fn browsing(category: Category, domain: Option<String>) -> Self {
        Self {
            category,
            state: DinoState::Browsing(category),
            domain,
        }
    }
}

/// Classify a raw activity signal against the rule table.
///
/// Non-browser app matches win outright and ignore any URL. For browsers the
/// priority order is: user overrides, built-in domain lists, keyword lists
/// over `url + " " + title`, fallback heuristics, then `other`. Malformed
/// URLs degrade to `other` instead of erroring.
pub fn classify(signal: &ActivitySignal, rules: &RulesConfig) -> Classification {
    let app = signal.app_name.to_lowercase();

    if matches_any(&app, &rules.coding_apps) {
        return Classification::app(Category::Coding);
    }
    if matches_any(&app, &rules.work_apps) {
        return Classification::app(Category::Work);
    }
    if matches_any(&app, &rules.design_apps) {
        return Classification::app(Category::Designing);
    }
    if matches_any(&app, &rules.gaming_apps) {
        return Classification::app(Category::Gaming);
    }

    if matches_any(&app, &rules.browsers) {
        return match &signal.url {
            Some(raw_url) => classify_url(raw_url, signal.title.as_deref(), rules),
            None => Classification::browsing(Category::Other, None),
        };
    }

    Classification {
        category: Category::Idle,
        state: DinoState::Idle,
        domain: None,
    }
}

fn classify_url(raw_url: &str, title: Option<&str>, rules: &RulesConfig) -> Classification {
    let lowered = raw_url.to_lowercase();

    let domain = match Url::parse(&lowered) {
        Ok(url) => match url.host_str() {
            Some(host) => host.trim_start_matches("www.").to_string(),
            None => return Classification::browsing(Category::Other, None),
        },
        Err(_) => return Classification::browsing(Category::Other, None),
    };

    // User overrides beat every built-in rule.
    for (pattern, category) in &rules.overrides {
        if domain.contains(pattern.to_lowercase().as_str()) {
            return Classification::browsing(*category, Some(domain));
        }
    }

    for (category, profile) in &rules.categories {
        if profile.domains.iter().any(|d| domain.contains(d.as_str())) {
            return Classification::browsing(*category, Some(domain));
        }
    }

    let haystack = match title {
        Some(title) => format!("{} {}", lowered, title.to_lowercase()),
        None => lowered.clone(),
    };
    for (category, profile) in &rules.categories {
        if profile.keywords.iter().any(|k| haystack.contains(k.as_str())) {
            return Classification::browsing(*category, Some(domain));
        }
    }

    // Fallback heuristics: auth flows read as work, institutional TLDs as
    // learning.
    if ["login", "signin", "sign-in", "auth"].iter().any(|k| haystack.contains(k)) {
        return Classification::browsing(Category::Work, Some(domain));
    }
    if domain.ends_with(".gov") || domain.ends_with(".edu") {
        return Classification::browsing(Category::Learning, Some(domain));
    }

    Classification::browsing(Category::Other, Some(domain))
}

fn matches_any(app: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| app.contains(p.as_str()))
}
