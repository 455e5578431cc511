//! # Dismissal Filter
//!
//! Read-time overlay of standing dismissals on stored results. Stored results are never
//! modified, so removing a dismissal brings matching results back on the next read.
//!
//! The dismissals consulted for a cluster are the union of those scoped to the cluster and
//! every `All`-level dismissal. The union is merged in memory from two store queries.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{DismissLevel, Dismissal, DismissalSearchSpace, WrappedCheckerResult};
use crate::store::{Store, StoreResult};

/// Results left visible after filtering, plus how many were hidden
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredResults {
    pub results: Vec<WrappedCheckerResult>,
    pub dismissed: usize,
}

/// Drop every result matched by at least one unexpired dismissal
pub fn filter_dismissed(
    results: Vec<WrappedCheckerResult>,
    dismissals: &[Dismissal],
    now: DateTime<Utc>,
) -> FilteredResults {
    if dismissals.is_empty() {
        return FilteredResults {
            results,
            dismissed: 0,
        };
    }

    let total = results.len();
    let visible: Vec<WrappedCheckerResult> = results
        .into_iter()
        .filter(|result| !dismissals.iter().any(|d| d.is_dismissed_at(result, now)))
        .collect();

    FilteredResults {
        dismissed: total - visible.len(),
        results: visible,
    }
}

/// Dismissals that can apply to `cluster_uuid`
///
/// With no cluster every stored dismissal is returned; matching still applies the full
/// containment rule per result. Each query that fails is logged and contributes nothing, so
/// the union keeps whatever did load.
pub async fn dismissals_for_cluster(store: &dyn Store, cluster_uuid: Option<&str>) -> Vec<Dismissal> {
    let Some(uuid) = cluster_uuid else {
        return or_empty(
            "*",
            "all",
            store.get_dismissals(&DismissalSearchSpace::default()).await,
        );
    };

    let mut dismissals = or_empty(
        uuid,
        "cluster",
        store
            .get_dismissals(&DismissalSearchSpace::by_cluster(uuid))
            .await,
    );
    let global = or_empty(
        uuid,
        "level",
        store
            .get_dismissals(&DismissalSearchSpace::by_level(DismissLevel::All))
            .await,
    );

    let mut seen: HashSet<String> = dismissals.iter().map(|d| d.id.clone()).collect();
    dismissals.extend(global.into_iter().filter(|d| seen.insert(d.id.clone())));
    dismissals
}

fn or_empty(cluster: &str, query: &str, fetched: StoreResult<Vec<Dismissal>>) -> Vec<Dismissal> {
    fetched.unwrap_or_else(|e| {
        warn!(
            cluster = cluster,
            query = query,
            error = %e,
            "Could not load dismissals, treating query as empty"
        );
        Vec::new()
    })
}

/// Fetch the dismissal union for a cluster and filter `results` against it
///
/// A failing dismissal query hides nothing; the other query still applies.
pub async fn apply_dismissals(
    store: &dyn Store,
    cluster_uuid: Option<&str>,
    results: Vec<WrappedCheckerResult>,
) -> FilteredResults {
    let dismissals = dismissals_for_cluster(store, cluster_uuid).await;
    filter_dismissed(results, &dismissals, Utc::now())
}
