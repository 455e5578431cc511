use proptest::prelude::*;

use clustermon_core::models::DismissLevel;

/// Outcome of one checker within a simulated cluster run: `true` means it failed
pub fn checker_outcomes_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..25)
}

pub fn dismiss_level_strategy() -> impl Strategy<Value = DismissLevel> {
    prop_oneof![
        Just(DismissLevel::All),
        Just(DismissLevel::Cluster),
        Just(DismissLevel::Bucket),
        Just(DismissLevel::Node),
    ]
}

/// Small identifier pools so generated scopes collide often
pub fn cluster_id_strategy() -> impl Strategy<Value = String> {
    "c-[1-3]"
}

pub fn scope_id_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of("s-[1-2]")
}
