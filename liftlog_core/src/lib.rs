#![forbid(unsafe_code)]

//! Core domain model and business logic for the Liftlog workout tracker.
//!
//! This crate provides:
//! - Domain types (sessions, exercises, sets, training config)
//! - The active session engine (state machine, clock, rest timer)
//! - Snapshot validation and repair
//! - Metrics aggregation (volume, density, records, quality score)
//! - Persistence boundary (JSONL log, snapshot state, CSV archive)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod ledger;
pub mod clock;
pub mod recommend;
pub mod validate;
pub mod metrics;
pub mod store;
pub mod state;
pub mod history;
pub mod csv_archive;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use ledger::Ledger;
pub use clock::{ClockTick, RestTimer, RestTimerEvent, SessionClock};
pub use recommend::{next_set_recommendation, SetRecommendation, MIN_REST_SECONDS};
pub use validate::{repair_snapshot, validate_snapshot, ValidationReport};
pub use store::{JsonlStore, MemoryStore, PersistenceAdapter};
pub use history::load_recent_sessions;
pub use engine::{EngineEvent, EngineOptions, FinishOutcome, SaveDecision, SessionEngine};
