//! # Checker Registry
//!
//! Immutable mapping from checker name to checker implementation, built once before the
//! monitor starts and shared by every worker for the life of the process.
//!
//! ## Usage
//!
//! ```rust
//! use clustermon_core::models::{CheckerResult, CheckerStatus, WrappedCheckerResult};
//! use clustermon_core::registry::{checker_fn, CheckerRegistry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = CheckerRegistry::builder()
//!     .register(
//!         "singleOrTwoNodeCluster",
//!         checker_fn(|cluster| {
//!             let status = if cluster.nodes.len() > 2 {
//!                 CheckerStatus::Good
//!             } else {
//!                 CheckerStatus::Warn
//!             };
//!             Ok(vec![Ok(WrappedCheckerResult::cluster_scoped(
//!                 cluster.uuid.clone(),
//!                 CheckerResult::new("singleOrTwoNodeCluster", status),
//!             ))])
//!         }),
//!     )?
//!     .build();
//!
//! assert_eq!(registry.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{CheckerError, RegistryError};
use crate::models::{ClusterSnapshot, WrappedCheckerResult};

/// Outcome of a single result entry; an error here drops only this entry
pub type EntryResult = Result<WrappedCheckerResult, CheckerError>;

/// Outcome of a whole checker run; an error here discards every entry
pub type CheckerOutput = Result<Vec<EntryResult>, CheckerError>;

/// A pluggable rule evaluated against one cluster snapshot
///
/// Implementations must be safe to invoke concurrently for different clusters and must not
/// keep the snapshot past the call. The token is cancelled when the monitor shuts down.
#[async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self, cluster: &ClusterSnapshot, cancel: &CancellationToken) -> CheckerOutput;
}

/// Adapter running a synchronous closure as a [`Checker`]
pub struct FnChecker<F> {
    f: F,
}

/// Wrap a synchronous closure as a checker
pub fn checker_fn<F>(f: F) -> FnChecker<F>
where
    F: Fn(&ClusterSnapshot) -> CheckerOutput + Send + Sync,
{
    FnChecker { f }
}

#[async_trait]
impl<F> Checker for FnChecker<F>
where
    F: Fn(&ClusterSnapshot) -> CheckerOutput + Send + Sync,
{
    async fn check(&self, cluster: &ClusterSnapshot, cancel: &CancellationToken) -> CheckerOutput {
        if cancel.is_cancelled() {
            return Err(CheckerError::Cancelled);
        }
        (self.f)(cluster)
    }
}

/// Which information source a checker evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckerType {
    #[default]
    Api,
    Log,
    System,
}

/// Display metadata for a registered checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerDefinition {
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub checker_type: CheckerType,
}

impl CheckerDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            description: String::new(),
            checker_type: CheckerType::Api,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Clone)]
pub struct RegisteredChecker {
    pub definition: CheckerDefinition,
    pub checker: Arc<dyn Checker>,
}

impl fmt::Debug for RegisteredChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredChecker")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

/// Immutable set of checkers, iterated in name order
#[derive(Debug, Clone, Default)]
pub struct CheckerRegistry {
    checkers: BTreeMap<String, RegisteredChecker>,
}

impl CheckerRegistry {
    pub fn builder() -> CheckerRegistryBuilder {
        CheckerRegistryBuilder::default()
    }

    /// Registry with no checkers
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredChecker> {
        self.checkers.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.checkers.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegisteredChecker)> {
        self.checkers.iter().map(|(name, c)| (name.as_str(), c))
    }

    pub fn definitions(&self) -> Vec<&CheckerDefinition> {
        self.checkers.values().map(|c| &c.definition).collect()
    }
}

#[derive(Default)]
pub struct CheckerRegistryBuilder {
    checkers: BTreeMap<String, RegisteredChecker>,
}

impl CheckerRegistryBuilder {
    /// Register a checker under `name` with a default definition
    pub fn register<C>(self, name: impl Into<String>, checker: C) -> Result<Self, RegistryError>
    where
        C: Checker + 'static,
    {
        self.register_definition(CheckerDefinition::new(name), checker)
    }

    pub fn register_definition<C>(
        self,
        definition: CheckerDefinition,
        checker: C,
    ) -> Result<Self, RegistryError>
    where
        C: Checker + 'static,
    {
        self.register_shared(definition, Arc::new(checker))
    }

    pub fn register_shared(
        mut self,
        definition: CheckerDefinition,
        checker: Arc<dyn Checker>,
    ) -> Result<Self, RegistryError> {
        if definition.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.checkers.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateChecker {
                name: definition.name,
            });
        }

        self.checkers.insert(
            definition.name.clone(),
            RegisteredChecker {
                definition,
                checker,
            },
        );
        Ok(self)
    }

    pub fn build(self) -> CheckerRegistry {
        CheckerRegistry {
            checkers: self.checkers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckerResult, CheckerStatus};

    fn good_checker(name: &'static str) -> impl Checker {
        checker_fn(move |cluster| {
            Ok(vec![Ok(WrappedCheckerResult::cluster_scoped(
                cluster.uuid.clone(),
                CheckerResult::new(name, CheckerStatus::Good),
            ))])
        })
    }

    #[test]
    fn test_registry_keeps_name_order() {
        let registry = CheckerRegistry::builder()
            .register("mixedMode", good_checker("mixedMode"))
            .unwrap()
            .register("autoFailover", good_checker("autoFailover"))
            .unwrap()
            .build();

        assert_eq!(registry.names(), vec!["autoFailover", "mixedMode"]);
        assert!(registry.get("mixedMode").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = CheckerRegistry::builder()
            .register("mixedMode", good_checker("mixedMode"))
            .unwrap()
            .register("mixedMode", good_checker("mixedMode"));

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateChecker { name }) if name == "mixedMode"
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = CheckerRegistry::builder().register("", good_checker("x"));
        assert!(matches!(result, Err(RegistryError::EmptyName)));
    }

    #[test]
    fn test_definitions_exposed() {
        let registry = CheckerRegistry::builder()
            .register_definition(
                CheckerDefinition::new("maxBuckets")
                    .with_title("Number of Buckets")
                    .with_description("More than 30 buckets can impact performance."),
                good_checker("maxBuckets"),
            )
            .unwrap()
            .build();

        let definitions = registry.definitions();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].title, "Number of Buckets");
        assert_eq!(definitions[0].checker_type, CheckerType::Api);
    }

    #[tokio::test]
    async fn test_fn_checker_respects_cancellation() {
        let checker = good_checker("mixedMode");
        let cluster = ClusterSnapshot::new("c-1", "prod");
        let token = CancellationToken::new();

        let output = checker.check(&cluster, &token).await.unwrap();
        assert_eq!(output.len(), 1);

        token.cancel();
        assert!(matches!(
            checker.check(&cluster, &token).await,
            Err(CheckerError::Cancelled)
        ));
    }
}
