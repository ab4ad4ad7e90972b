//! Core domain types for the liftlog workout session engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Session lifecycle status and training configuration
//! - Exercises and sets
//! - Serializable session snapshots and archival records
//! - Exercise catalog entries (muscle groups, categories)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Session Lifecycle Types
// ============================================================================

/// Lifecycle state of a workout session
///
/// Clock suspension while the host UI is backgrounded is an orthogonal flag
/// on the clock, not a status variant (see `clock::SessionClock`).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Active,
    Completing,
    Completed,
    Terminated,
}

/// Immutable setup chosen before a session starts
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrainingConfig {
    /// Free-form training type label (e.g. "strength", "hypertrophy")
    pub training_type: String,
    /// Target session duration in minutes
    pub target_duration_minutes: u32,
    /// Body-focus tags (e.g. "upper", "legs")
    pub body_focus: Vec<String>,
    pub tags: Vec<String>,
    /// Ranked exercise recommendations produced at setup time
    pub recommended_exercises: Vec<String>,
}

impl TrainingConfig {
    /// A config is considered empty when it carries no usable setup
    pub fn is_empty(&self) -> bool {
        self.training_type.trim().is_empty()
    }
}

// ============================================================================
// Exercise and Set Types
// ============================================================================

/// Provenance of an automatic recommendation applied to a set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetAdjustment {
    pub previous_weight: f64,
    pub previous_reps: u32,
    pub previous_rest_seconds: u32,
}

/// A single set of an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSet {
    /// Load in kilograms, 0 for pure bodyweight work
    pub weight: f64,
    pub reps: u32,
    /// Rest after this set, in seconds
    pub rest_seconds: u32,
    pub completed: bool,
    /// UI-only edit-in-progress flag, never persisted
    #[serde(skip)]
    pub is_editing: bool,
    /// Rate of Perceived Exertion, 1-10, recorded at completion
    pub rpe: Option<u8>,
    /// Values this set held before an automatic recommendation replaced them
    pub adjustment: Option<SetAdjustment>,
}

impl ExerciseSet {
    pub fn new(weight: f64, reps: u32, rest_seconds: u32) -> Self {
        Self {
            weight,
            reps,
            rest_seconds,
            completed: false,
            is_editing: false,
            rpe: None,
            adjustment: None,
        }
    }
}

/// Partial update to a set, applied through the ledger and journaled
/// through the persistence adapter
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SetPatch {
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub rest_seconds: Option<u32>,
    pub completed: Option<bool>,
    pub rpe: Option<u8>,
}

/// An exercise within a session: a name (unique in the session) plus its
/// ordered sets. Set numbers are the 1-based positions in `sets`, so
/// numbering is contiguous by construction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseEntry {
    pub name: String,
    pub variation: Option<String>,
    pub sets: Vec<ExerciseSet>,
}

impl ExerciseEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variation: None,
            sets: Vec::new(),
        }
    }
}

// ============================================================================
// Session Aggregate
// ============================================================================

/// The root aggregate: one workout attempt from start to completion or
/// termination. Exclusively owned by the session engine; the ledger is owned
/// by the session with no external aliasing.
#[derive(Clone, Debug)]
pub struct Session {
    /// Opaque identifier, created at session start, stable until termination
    pub id: Uuid,
    pub status: SessionStatus,
    pub training_config: Option<TrainingConfig>,
    /// Wall-clock anchor; `elapsed_seconds` is the authoritative progress
    /// counter, independent of wall-clock drift while backgrounded
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    pub ledger: crate::ledger::Ledger,
    /// Last UI location associated with this session, advisory only
    pub last_active_route: Option<String>,
}

impl Session {
    pub fn new_idle() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: SessionStatus::Idle,
            training_config: None,
            started_at: None,
            elapsed_seconds: 0,
            ledger: crate::ledger::Ledger::new(),
            last_active_route: None,
        }
    }

    /// Convert a raw snapshot without validating it. Callers are expected to
    /// run the validator first (`validate::repair_snapshot` does both); the
    /// elapsed counter is clamped here only because `u64` cannot represent
    /// the hostile values the raw form admits.
    pub fn from_snapshot_unchecked(snapshot: SessionSnapshot) -> Self {
        let elapsed = if snapshot.elapsed_seconds.is_finite() && snapshot.elapsed_seconds >= 0.0 {
            snapshot.elapsed_seconds as u64
        } else {
            0
        };
        Self {
            id: snapshot.id,
            status: snapshot.status,
            training_config: snapshot.training_config,
            started_at: snapshot.started_at,
            elapsed_seconds: elapsed,
            ledger: crate::ledger::Ledger::from_entries(snapshot.exercises),
            last_active_route: snapshot.last_active_route,
        }
    }

    pub fn to_snapshot(&self, clock_suspended: bool) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            status: self.status,
            training_config: self.training_config.clone(),
            started_at: self.started_at,
            elapsed_seconds: self.elapsed_seconds as f64,
            clock_suspended,
            exercises: self.ledger.entries().to_vec(),
            last_active_route: self.last_active_route.clone(),
        }
    }
}

// ============================================================================
// Session Snapshot and Archival Types
// ============================================================================

/// Serializable session representation exposed to subscribers and handed to
/// the persistence adapter.
///
/// `elapsed_seconds` is `f64` here so stale or hostile persisted data
/// (negative values, NaN) is representable at the boundary; it is normalized
/// exactly once by the validator when a snapshot re-enters the engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub status: SessionStatus,
    pub training_config: Option<TrainingConfig>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: f64,
    pub clock_suspended: bool,
    pub exercises: Vec<ExerciseEntry>,
    /// Last UI location associated with this session, advisory only
    pub last_active_route: Option<String>,
}

/// Archival record of a finished session, used by history loading and the
/// metrics aggregator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletedSession {
    pub id: Uuid,
    pub training_type: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub exercises: Vec<ExerciseEntry>,
}

impl CompletedSession {
    /// Build the archival record for a finishing session snapshot
    pub fn from_snapshot(snapshot: &SessionSnapshot, completed_at: DateTime<Utc>) -> Self {
        let duration = if snapshot.elapsed_seconds.is_finite() && snapshot.elapsed_seconds >= 0.0 {
            snapshot.elapsed_seconds as u64
        } else {
            0
        };
        Self {
            id: snapshot.id,
            training_type: snapshot
                .training_config
                .as_ref()
                .map(|c| c.training_type.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            started_at: snapshot.started_at.unwrap_or(completed_at),
            completed_at,
            duration_seconds: duration,
            exercises: snapshot.exercises.clone(),
        }
    }
}

/// Filter for history queries through the persistence adapter
#[derive(Clone, Debug, Default)]
pub struct HistoryFilter {
    pub since: Option<DateTime<Utc>>,
    pub exercise: Option<String>,
}

// ============================================================================
// Catalog Types
// ============================================================================

/// Primary muscle groups used for focus histograms and balance scoring
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Quads,
    Hamstrings,
    Glutes,
    Core,
    Calves,
}

/// Movement composition category
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Compound,
    Isolation,
    Bodyweight,
    Isometric,
}

/// A known exercise definition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogExercise {
    pub name: String,
    pub category: ExerciseCategory,
    pub primary_muscles: Vec<MuscleGroup>,
    /// For bodyweight movements: estimated share of body weight moved,
    /// substituted for `weight` when computing volume
    pub bodyweight_load_share: Option<f64>,
    pub tags: Vec<String>,
}

/// The complete catalog of known exercises, keyed by display name
#[derive(Clone, Debug)]
pub struct ExerciseCatalog {
    pub exercises: HashMap<String, CatalogExercise>,
}
