//! Built-in loading strategies.
//!
//! Strategies are scanned highest priority first; later (lower priority)
//! overriding strategies may replace same-name registrations made by
//! earlier ones. Consumers add their own locations by submitting more
//! [`StrategyRegistration`] rows.

use crate::registration::StrategyRegistration;

/// Runtime-internal declarations. Scanned first, never overridden.
pub const INTERNAL_LOCATION: &str = "relay/internal/";

/// The standard application location.
pub const MAIN_LOCATION: &str = "relay/";

/// Third-party add-on location, scanned last.
pub const EXTERNAL_LOCATION: &str = "relay/ext/";

inventory::submit! {
    StrategyRegistration {
        location: INTERNAL_LOCATION,
        priority: 100,
        overridden: false,
        excluded: &[],
    }
}

inventory::submit! {
    StrategyRegistration {
        location: MAIN_LOCATION,
        priority: 0,
        overridden: true,
        excluded: &[],
    }
}

inventory::submit! {
    StrategyRegistration {
        location: EXTERNAL_LOCATION,
        priority: -100,
        overridden: true,
        excluded: &[],
    }
}

/// All registered strategies, highest priority first. Ties keep a stable
/// order by location so repeated scans agree.
pub fn strategies() -> Vec<&'static StrategyRegistration> {
    let mut rows: Vec<&'static StrategyRegistration> =
        inventory::iter::<StrategyRegistration>.into_iter().collect();
    rows.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.location.cmp(b.location)));
    rows
}
