//! Session snapshot validation and repair.
//!
//! Snapshots re-enter the engine from persisted or backgrounded state and
//! cannot be trusted: a crashed tab can leave an "active" session with no
//! config, stale data can carry negative or non-finite elapsed time, and
//! interrupted edits can leave exercises with no sets. Classification is a
//! pure function over the snapshot; repair either produces a sanitized
//! typed session or reports the one fatal-but-recoverable condition that
//! requires the caller to reset and return to setup.
//!
//! This is the single normalization point for data crossing the persistence
//! boundary; internal engine logic never re-validates its own invariants.

use crate::{Error, Result, Session, SessionSnapshot, SessionStatus};

/// Outcome of classifying a candidate session snapshot
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// True when every violation found has a defined repair
    pub needs_repair: bool,
    pub reasons: Vec<String>,
}

impl ValidationReport {
    /// Unrepairable: not valid and repair is not possible
    pub fn is_corrupt(&self) -> bool {
        !self.is_valid && !self.needs_repair
    }
}

/// Classify a snapshot as valid, repairable, or corrupt
pub fn validate_snapshot(snapshot: &SessionSnapshot) -> ValidationReport {
    let mut reasons = Vec::new();
    let mut corrupt = false;

    let has_config = snapshot
        .training_config
        .as_ref()
        .map(|c| !c.is_empty())
        .unwrap_or(false);

    if snapshot.status == SessionStatus::Active {
        if !has_config && snapshot.exercises.is_empty() {
            // Nothing left to rebuild a session from
            reasons.push(
                "active session has neither training config nor exercises".to_string(),
            );
            corrupt = true;
        } else {
            if !has_config {
                reasons.push("active session is missing its training config".to_string());
            }
            if snapshot.started_at.is_none() {
                reasons.push("active session is missing its start timestamp".to_string());
            }
        }
    }

    if snapshot.exercises.iter().any(|e| e.sets.is_empty()) {
        reasons.push("session contains exercises with no sets".to_string());
    }

    if !snapshot.elapsed_seconds.is_finite() || snapshot.elapsed_seconds < 0.0 {
        reasons.push(format!(
            "elapsed_seconds is not a non-negative finite value: {}",
            snapshot.elapsed_seconds
        ));
    }

    ValidationReport {
        is_valid: reasons.is_empty(),
        needs_repair: !reasons.is_empty() && !corrupt,
        reasons,
    }
}

/// Repair a snapshot into a typed [`Session`], or fail with
/// [`Error::Validation`] when the snapshot is corrupt beyond repair.
///
/// Repairs applied:
/// - empty exercise entries are dropped (entry-fatal, not session-fatal)
/// - negative or non-finite elapsed time is reset to 0
/// - an active session missing its start timestamp is re-anchored to now
/// - an active session missing its config (but holding exercises) gets a
///   minimal recovered config so the user's set data survives
pub fn repair_snapshot(snapshot: SessionSnapshot) -> Result<Session> {
    let report = validate_snapshot(&snapshot);

    if report.is_corrupt() {
        return Err(Error::Validation(report.reasons.join("; ")));
    }

    if report.needs_repair {
        for reason in &report.reasons {
            tracing::warn!("Repairing session snapshot: {}", reason);
        }
    }

    let mut session = Session::from_snapshot_unchecked(snapshot);

    let dropped = session.ledger.prune_empty_exercises();
    if dropped > 0 {
        tracing::warn!("Dropped {} empty exercise entries during repair", dropped);
    }

    if session.status == SessionStatus::Active {
        if session.started_at.is_none() {
            session.started_at = Some(chrono::Utc::now());
        }
        if session
            .training_config
            .as_ref()
            .map(|c| c.is_empty())
            .unwrap_or(true)
        {
            session.training_config = Some(crate::TrainingConfig {
                training_type: "recovered".to_string(),
                target_duration_minutes: 0,
                body_focus: Vec::new(),
                tags: Vec::new(),
                recommended_exercises: Vec::new(),
            });
        }
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExerciseEntry, ExerciseSet, TrainingConfig};
    use chrono::Utc;
    use uuid::Uuid;

    fn config() -> TrainingConfig {
        TrainingConfig {
            training_type: "strength".into(),
            target_duration_minutes: 30,
            body_focus: vec!["upper".into()],
            tags: vec![],
            recommended_exercises: vec![],
        }
    }

    fn snapshot() -> SessionSnapshot {
        let mut entry = ExerciseEntry::new("Bench Press");
        entry.sets.push(ExerciseSet::new(60.0, 8, 90));
        SessionSnapshot {
            id: Uuid::new_v4(),
            status: SessionStatus::Active,
            training_config: Some(config()),
            started_at: Some(Utc::now()),
            elapsed_seconds: 300.0,
            clock_suspended: false,
            exercises: vec![entry],
            last_active_route: Some("/workout".into()),
        }
    }

    #[test]
    fn test_well_formed_snapshot_is_valid() {
        let report = validate_snapshot(&snapshot());
        assert!(report.is_valid);
        assert!(!report.needs_repair);
        assert!(report.reasons.is_empty());
    }

    #[test]
    fn test_active_without_config_and_exercises_is_corrupt() {
        let mut snap = snapshot();
        snap.training_config = None;
        snap.exercises.clear();

        let report = validate_snapshot(&snap);
        assert!(!report.is_valid);
        assert!(!report.needs_repair);
        assert!(report.is_corrupt());

        // Repair is not possible: caller must reset and restart setup
        assert!(matches!(repair_snapshot(snap), Err(Error::Validation(_))));
    }

    #[test]
    fn test_missing_start_timestamp_is_repairable() {
        let mut snap = snapshot();
        snap.started_at = None;

        let report = validate_snapshot(&snap);
        assert!(!report.is_valid);
        assert!(report.needs_repair);

        let session = repair_snapshot(snap).unwrap();
        assert!(session.started_at.is_some());
    }

    #[test]
    fn test_empty_exercise_entries_dropped_on_repair() {
        let mut snap = snapshot();
        snap.exercises.push(ExerciseEntry::new("Ghost Exercise"));

        let report = validate_snapshot(&snap);
        assert!(report.needs_repair);

        let session = repair_snapshot(snap).unwrap();
        assert!(session.ledger.exercise("Ghost Exercise").is_none());
        assert!(session.ledger.exercise("Bench Press").is_some());
    }

    #[test]
    fn test_negative_elapsed_reset_to_zero() {
        let mut snap = snapshot();
        snap.elapsed_seconds = -45.0;

        let session = repair_snapshot(snap).unwrap();
        assert_eq!(session.elapsed_seconds, 0);
    }

    #[test]
    fn test_nan_elapsed_reset_to_zero() {
        let mut snap = snapshot();
        snap.elapsed_seconds = f64::NAN;

        let report = validate_snapshot(&snap);
        assert!(report.needs_repair);

        let session = repair_snapshot(snap).unwrap();
        assert_eq!(session.elapsed_seconds, 0);
    }

    #[test]
    fn test_missing_config_with_exercises_survives() {
        let mut snap = snapshot();
        snap.training_config = None;

        let session = repair_snapshot(snap).unwrap();
        assert!(session.training_config.is_some());
        assert_eq!(session.ledger.len(), 1);
    }

    #[test]
    fn test_idle_snapshot_needs_no_config() {
        let mut snap = snapshot();
        snap.status = SessionStatus::Idle;
        snap.training_config = None;
        snap.started_at = None;
        snap.exercises.clear();

        let report = validate_snapshot(&snap);
        assert!(report.is_valid);
    }
}
