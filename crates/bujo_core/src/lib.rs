//! Core of the bujo backend: cross-type item aggregation and change signals.
//! This crate is the single source of truth for bucketing and fingerprinting
//! invariants; storage and access control are collaborator contracts.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod signal;
pub mod source;

pub use aggregate::{AggregationError, AggregationQuery, AggregationResult, Aggregator};
pub use config::{load_config, AggregationConfig, ConfigError, CoreConfig, LoggingConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::bucket::DateBucket;
pub use model::item::{ItemAnchor, ItemId, ProjectItem, Task, Transaction, TransactionType};
pub use model::project::{Project, ProjectId, ProjectKind};
pub use service::{ProjectItemsService, SystemUpdatesService};
pub use signal::{
    ChangeSignal, NamedCollection, OrderRule, SignalComputer, SignalError, SignalResult,
    UpdateSignalCoordinator, UpdateSignals, UpdateTarget,
};
pub use source::memory::{Fixture, InMemoryStore};
pub use source::router::{RouterError, TypeRouter};
pub use source::sqlite::SqliteStore;
pub use source::{
    CollectionProvider, DateWindow, ItemSource, ProjectDirectory, SourceError, SourceResult,
};

/// Version reported by front ends (`bujo --version`).
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
