//! # Registry Infrastructure
//!
//! The checker plugin contract and the immutable registry the worker pool iterates.
//!
//! ## Overview
//!
//! A checker is registered once, under a unique name, before the monitor is built. The
//! registry is passed into the monitor's constructor rather than held in a global, so tests
//! can run the full engine against fake checkers.
//!
//! ```text
//! Registry Infrastructure
//! ├── Checker              (async plugin trait, cancellation aware)
//! ├── FnChecker            (adapter for synchronous closures)
//! └── CheckerRegistry      (name → checker + definition, fixed for process lifetime)
//! ```

pub mod checker_registry;

pub use checker_registry::{
    checker_fn, Checker, CheckerDefinition, CheckerOutput, CheckerRegistry,
    CheckerRegistryBuilder, CheckerType, EntryResult, FnChecker, RegisteredChecker,
};
