//! The workout session engine.
//!
//! One `SessionEngine` instance is the single owner of the single mutable
//! resource in the core, the [`Session`]. Every mutation is serialized
//! through its entry points, snapshots are published to subscribers after
//! each mutating operation, and the injected [`PersistenceAdapter`] is the
//! only collaborator the engine ever calls out to.

use crate::clock::{ClockTick, RestTimer, RestTimerEvent, SessionClock};
use crate::metrics::{self, SessionSummary};
use crate::recommend::{next_set_recommendation, SetRecommendation};
use crate::store::PersistenceAdapter;
use crate::validate;
use crate::{
    Config, Error, ExerciseCatalog, ExerciseSet, Result, Session, SessionSnapshot, SessionStatus,
    SetAdjustment, SetPatch, TrainingConfig,
};
use chrono::Utc;
use uuid::Uuid;

/// What the caller wants done with the session when finishing it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveDecision {
    Save,
    Discard,
}

/// Resolution of a `finish()` call
#[derive(Debug)]
pub enum FinishOutcome {
    Saved {
        session_id: Uuid,
        summary: SessionSummary,
    },
    Discarded,
}

/// Events surfaced by one engine tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    Clock(ClockTick),
    Rest(RestTimerEvent),
}

/// Engine parameters derived from configuration
#[derive(Clone, Copy, Debug)]
pub struct EngineOptions {
    pub default_rest_seconds: u32,
    pub body_weight_kg: f64,
    pub work_seconds_per_set: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_rest_seconds: 90,
            body_weight_kg: 75.0,
            work_seconds_per_set: metrics::DEFAULT_WORK_SECONDS_PER_SET,
        }
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            default_rest_seconds: config.session.default_rest_seconds,
            body_weight_kg: config.athlete.body_weight_kg,
            work_seconds_per_set: config.session.work_seconds_per_set,
        }
    }
}

type Listener = Box<dyn FnMut(&SessionSnapshot)>;

/// The session state machine.
///
/// Hosts drive time by calling [`SessionEngine::tick`] once per second;
/// page visibility changes map to [`SessionEngine::on_hidden`] and
/// [`SessionEngine::on_visible`], which suspend only the clock tick.
pub struct SessionEngine {
    session: Session,
    clock: SessionClock,
    rest_timer: RestTimer,
    adapter: Box<dyn PersistenceAdapter>,
    catalog: ExerciseCatalog,
    options: EngineOptions,
    listeners: Vec<Listener>,
}

impl SessionEngine {
    pub fn new(
        adapter: Box<dyn PersistenceAdapter>,
        catalog: ExerciseCatalog,
        options: EngineOptions,
    ) -> Self {
        Self {
            session: Session::new_idle(),
            clock: SessionClock::new(),
            rest_timer: RestTimer::new(),
            adapter,
            catalog,
            options,
            listeners: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Register a snapshot listener, invoked after every mutating operation
    pub fn subscribe(&mut self, listener: impl FnMut(&SessionSnapshot) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// The serializable view of the current session
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.to_snapshot(self.clock.is_suspended())
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.session.elapsed_seconds
    }

    pub fn rest_remaining_seconds(&self) -> Option<u32> {
        self.rest_timer
            .is_active()
            .then(|| self.rest_timer.remaining_seconds())
    }

    fn notify(&mut self) {
        let snapshot = self.session.to_snapshot(self.clock.is_suspended());
        for listener in &mut self.listeners {
            listener(&snapshot);
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start a new session from setup.
    ///
    /// Requires an idle engine: a previous session, whatever its state,
    /// must be dropped with an explicit `reset()` first. Two configs are
    /// never merged silently.
    pub fn start(&mut self, config: TrainingConfig) -> Result<()> {
        if self.session.status != SessionStatus::Idle {
            return Err(Error::InvalidTransition(format!(
                "cannot start while session is {:?}; reset first",
                self.session.status
            )));
        }
        if config.is_empty() {
            return Err(Error::Validation(
                "training config must carry a training type".into(),
            ));
        }

        self.session = Session::new_idle();
        self.session.training_config = Some(config);
        self.session.started_at = Some(Utc::now());
        self.session.status = SessionStatus::Active;

        self.clock.reset();
        self.clock.start();
        self.rest_timer.cancel();

        tracing::info!("Session {} started", self.session.id);
        self.notify();
        Ok(())
    }

    /// Re-anchor the clock of a session already in memory (navigation away
    /// and back) without resetting the accumulated elapsed time
    pub fn resume_existing(&mut self) -> Result<()> {
        if self.session.status != SessionStatus::Active {
            return Err(Error::InvalidTransition(format!(
                "no active session to resume (status {:?})",
                self.session.status
            )));
        }
        self.clock.start();
        tracing::debug!(
            "Session {} resumed at {}s",
            self.session.id,
            self.session.elapsed_seconds
        );
        self.notify();
        Ok(())
    }

    /// Adopt a persisted snapshot, running it through the validator first.
    ///
    /// A repairable snapshot is sanitized and adopted; a corrupt one forces
    /// a reset and surfaces a validation error so the caller can route the
    /// user back to setup with an explanation.
    pub fn restore(&mut self, snapshot: SessionSnapshot) -> Result<()> {
        match validate::repair_snapshot(snapshot) {
            Ok(session) => {
                self.clock.reset();
                self.clock.restore(session.elapsed_seconds);
                if session.status == SessionStatus::Active {
                    self.clock.start();
                }
                self.rest_timer.cancel();
                self.session = session;
                tracing::info!(
                    "Session {} restored at {}s",
                    self.session.id,
                    self.session.elapsed_seconds
                );
                self.notify();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Snapshot unrecoverable, resetting: {}", e);
                self.reset();
                Err(e)
            }
        }
    }

    /// Universal cancellation: discard the session, stop the clock and any
    /// rest timer, return to idle. Always succeeds, even mid-completing.
    pub fn reset(&mut self) {
        self.session = Session::new_idle();
        self.clock.reset();
        self.rest_timer.cancel();
        tracing::debug!("Session reset to idle");
        self.notify();
    }

    // ------------------------------------------------------------------
    // Ledger operations
    // ------------------------------------------------------------------

    /// Record the UI location to persist alongside the session. Advisory
    /// only: it supports resume and is never part of session validity.
    pub fn set_last_active_route(&mut self, route: impl Into<String>) {
        self.session.last_active_route = Some(route.into());
        self.notify();
    }

    fn require_active(&self, operation: &str) -> Result<()> {
        if self.session.status != SessionStatus::Active {
            return Err(Error::InvalidTransition(format!(
                "{} requires an active session (status {:?})",
                operation, self.session.status
            )));
        }
        Ok(())
    }

    /// Append a new exercise. Without an initial set a blank one is seeded
    /// so no exercise ever exists with zero sets.
    pub fn add_exercise(
        &mut self,
        name: impl Into<String>,
        initial_set: Option<ExerciseSet>,
    ) -> Result<()> {
        self.require_active("add_exercise")?;
        let set = initial_set
            .unwrap_or_else(|| ExerciseSet::new(0.0, 0, self.options.default_rest_seconds));
        self.session.ledger.add_exercise(name, Some(set))?;
        self.notify();
        Ok(())
    }

    /// Append a set to an exercise, prefilled from its last set when no
    /// explicit set is given. Returns the new 1-based set number.
    pub fn add_set(&mut self, exercise: &str, set: Option<ExerciseSet>) -> Result<u32> {
        self.require_active("add_set")?;
        let set = match set {
            Some(set) => set,
            None => {
                let template = self
                    .session
                    .ledger
                    .exercise(exercise)
                    .ok_or_else(|| Error::NotFound(format!("exercise '{}'", exercise)))?
                    .sets
                    .last()
                    .cloned();
                match template {
                    Some(previous) => ExerciseSet {
                        completed: false,
                        is_editing: false,
                        rpe: None,
                        adjustment: None,
                        ..previous
                    },
                    None => ExerciseSet::new(0.0, 0, self.options.default_rest_seconds),
                }
            }
        };
        let number = self.session.ledger.add_set(exercise, set)?;
        self.notify();
        Ok(number)
    }

    pub fn update_set(&mut self, exercise: &str, set_number: u32, patch: &SetPatch) -> Result<()> {
        self.require_active("update_set")?;
        self.session.ledger.update_set(exercise, set_number, patch)?;
        self.journal_mutation(exercise, set_number, patch);
        self.notify();
        Ok(())
    }

    pub fn remove_set(&mut self, exercise: &str, set_number: u32) -> Result<()> {
        self.require_active("remove_set")?;
        self.session.ledger.remove_set(exercise, set_number)?;
        self.notify();
        Ok(())
    }

    /// Idempotent: removing an absent exercise is a no-op
    pub fn remove_exercise(&mut self, name: &str) -> Result<()> {
        self.require_active("remove_exercise")?;
        self.session.ledger.remove_exercise(name);
        self.notify();
        Ok(())
    }

    /// Mark a set completed, apply the RPE-driven recommendation to the
    /// next set of the same exercise if one exists, and start the rest
    /// timer from the recommended rest.
    ///
    /// Returns the recommendation so the UI can prefill a set it has yet to
    /// create.
    pub fn complete_set(
        &mut self,
        exercise: &str,
        set_number: u32,
        rpe: Option<u8>,
    ) -> Result<SetRecommendation> {
        self.require_active("complete_set")?;
        if let Some(r) = rpe {
            if !(1..=10).contains(&r) {
                return Err(Error::Validation(format!("rpe must be 1-10, got {}", r)));
            }
        }

        let set = self.session.ledger.set_mut(exercise, set_number)?;
        set.completed = true;
        set.is_editing = false;
        set.rpe = rpe;
        let completed = set.clone();

        let recommendation = next_set_recommendation(&completed, rpe);

        // Prefill the following set, keeping provenance so the adjustment
        // can be explained or undone. An identity recommendation leaves the
        // next set untouched.
        if let Ok(next) = self.session.ledger.set_mut(exercise, set_number + 1) {
            let changes = recommendation.weight != next.weight
                || recommendation.reps != next.reps
                || recommendation.rest_seconds != next.rest_seconds;
            if !next.completed && changes {
                next.adjustment = Some(SetAdjustment {
                    previous_weight: next.weight,
                    previous_reps: next.reps,
                    previous_rest_seconds: next.rest_seconds,
                });
                next.weight = recommendation.weight;
                next.reps = recommendation.reps;
                next.rest_seconds = recommendation.rest_seconds;
            }
        }

        self.rest_timer.start(recommendation.rest_seconds);

        let patch = SetPatch {
            completed: Some(true),
            rpe,
            ..SetPatch::default()
        };
        self.journal_mutation(exercise, set_number, &patch);

        tracing::debug!(
            "Completed {} set {} (rpe {:?}), rest {}s",
            exercise,
            set_number,
            rpe,
            recommendation.rest_seconds
        );
        self.notify();
        Ok(recommendation)
    }

    /// Journal a set mutation through the adapter. The journal is advisory
    /// mid-session; the authoritative save happens at finish, so a failure
    /// here is logged and does not fail the mutation that already applied.
    fn journal_mutation(&mut self, exercise: &str, set_number: u32, patch: &SetPatch) {
        if let Err(e) =
            self.adapter
                .save_set_mutation(self.session.id, exercise, set_number, patch)
        {
            tracing::warn!(
                "Failed to journal mutation of {} set {}: {}",
                exercise,
                set_number,
                e
            );
        }
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Advance both timers by one second, returning the events crossed
    pub fn tick(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();

        if let Some(tick) = self.clock.tick() {
            self.session.elapsed_seconds = tick.elapsed_seconds;
            events.push(EngineEvent::Clock(tick));
        }
        for event in self.rest_timer.tick() {
            events.push(EngineEvent::Rest(event));
        }

        if !events.is_empty() {
            self.notify();
        }
        events
    }

    /// Page hidden: suspend the clock tick without touching the count.
    /// The rest timer keeps counting; backgrounding is not a cancellation.
    pub fn on_hidden(&mut self) {
        self.clock.suspend();
        self.notify();
    }

    /// Page visible again: resume ticking from the retained count, with no
    /// catch-up burst for the hidden interval
    pub fn on_visible(&mut self) {
        self.clock.resume();
        self.notify();
    }

    // ------------------------------------------------------------------
    // Finishing
    // ------------------------------------------------------------------

    /// Finish the session.
    ///
    /// From `Active` this validates (a corrupt session forces a reset and
    /// can never be saved), then either terminates without saving or moves
    /// to `Completing` and calls the persistence adapter. On adapter
    /// failure the session stays in `Completing`; calling again with
    /// `Save` retries, with `Discard` abandons.
    pub fn finish(&mut self, decision: SaveDecision) -> Result<FinishOutcome> {
        match self.session.status {
            SessionStatus::Active => {
                let report = validate::validate_snapshot(&self.snapshot());
                if report.is_corrupt() {
                    let reasons = report.reasons.join("; ");
                    tracing::error!("Session corrupt at finish, resetting: {}", reasons);
                    self.reset();
                    return Err(Error::Validation(reasons));
                }
                if report.needs_repair {
                    for reason in &report.reasons {
                        tracing::warn!("Sanitizing session before finish: {}", reason);
                    }
                    self.session.ledger.prune_empty_exercises();
                    if self.session.started_at.is_none() {
                        self.session.started_at = Some(Utc::now());
                    }
                }

                match decision {
                    SaveDecision::Discard => {
                        self.session.status = SessionStatus::Terminated;
                        self.clock.stop();
                        self.rest_timer.cancel();
                        tracing::info!("Session {} terminated without saving", self.session.id);
                        self.notify();
                        Ok(FinishOutcome::Discarded)
                    }
                    SaveDecision::Save => {
                        if self.session.ledger.completed_sets() == 0 {
                            // Session stays active; the UI offers "cannot
                            // save" instead of erroring silently
                            return Err(Error::NothingToSave);
                        }
                        self.session.status = SessionStatus::Completing;
                        self.clock.stop();
                        self.rest_timer.cancel();
                        self.notify();
                        self.try_save()
                    }
                }
            }
            SessionStatus::Completing => match decision {
                SaveDecision::Save => self.try_save(),
                SaveDecision::Discard => {
                    self.session.status = SessionStatus::Terminated;
                    tracing::info!("Session {} abandoned after failed save", self.session.id);
                    self.notify();
                    Ok(FinishOutcome::Discarded)
                }
            },
            status => Err(Error::InvalidTransition(format!(
                "finish requires an active session (status {:?})",
                status
            ))),
        }
    }

    fn try_save(&mut self) -> Result<FinishOutcome> {
        let snapshot = self.snapshot();
        let summary = metrics::session_summary(
            &snapshot.exercises,
            self.session.elapsed_seconds,
            &self.catalog,
            self.options.body_weight_kg,
            self.options.work_seconds_per_set,
        );

        match self.adapter.save_session(&snapshot) {
            Ok(session_id) => {
                self.session.status = SessionStatus::Completed;
                tracing::info!("Session {} saved", session_id);
                self.notify();
                Ok(FinishOutcome::Saved {
                    session_id,
                    summary,
                })
            }
            Err(e) => {
                // Never mark completed without adapter confirmation; the
                // session stays in completing for a retry or reset
                tracing::error!("Failed to save session {}: {}", self.session.id, e);
                match e {
                    Error::Persistence(_) => Err(e),
                    other => Err(Error::Persistence(other.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_default_catalog;
    use crate::store::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn config() -> TrainingConfig {
        TrainingConfig {
            training_type: "strength".into(),
            target_duration_minutes: 30,
            body_focus: vec!["upper".into()],
            tags: vec![],
            recommended_exercises: vec!["Bench Press".into()],
        }
    }

    fn create_engine() -> SessionEngine {
        SessionEngine::new(
            Box::new(MemoryStore::new()),
            build_default_catalog(),
            EngineOptions::default(),
        )
    }

    fn create_engine_with_store(store: MemoryStore) -> SessionEngine {
        SessionEngine::new(
            Box::new(store),
            build_default_catalog(),
            EngineOptions::default(),
        )
    }

    #[test]
    fn test_start_requires_idle() {
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        assert_eq!(engine.status(), SessionStatus::Active);

        // A second start with a different config pending must fail
        let result = engine.start(config());
        assert!(matches!(result, Err(Error::InvalidTransition(_))));

        // After an explicit reset it succeeds
        engine.reset();
        engine.start(config()).unwrap();
        assert_eq!(engine.status(), SessionStatus::Active);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        engine
            .add_exercise("Bench Press", Some(ExerciseSet::new(60.0, 8, 90)))
            .unwrap();

        engine.reset();
        let first = engine.snapshot();
        engine.reset();
        let second = engine.snapshot();

        assert_eq!(first.status, SessionStatus::Idle);
        assert_eq!(second.status, SessionStatus::Idle);
        assert!(second.exercises.is_empty());
        assert_eq!(second.elapsed_seconds, 0.0);
        assert!(second.training_config.is_none());
    }

    #[test]
    fn test_complete_set_applies_recommendation_to_next_set() {
        // Scenario: bench 60x8, RPE 2 -> next set prefilled 62.5 x 8,
        // rest shortened by 5s
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        engine
            .add_exercise("Bench Press", Some(ExerciseSet::new(60.0, 8, 90)))
            .unwrap();
        engine.add_set("Bench Press", None).unwrap();

        let rec = engine.complete_set("Bench Press", 1, Some(2)).unwrap();
        assert_eq!(rec.weight, 62.5);
        assert_eq!(rec.reps, 8);
        assert_eq!(rec.rest_seconds, 85);

        let snapshot = engine.snapshot();
        let next = &snapshot.exercises[0].sets[1];
        assert_eq!(next.weight, 62.5);
        assert_eq!(next.reps, 8);
        assert_eq!(next.rest_seconds, 85);
        let provenance = next.adjustment.as_ref().unwrap();
        assert_eq!(provenance.previous_weight, 60.0);
        assert_eq!(provenance.previous_rest_seconds, 90);

        // Rest timer started from the recommended rest
        assert_eq!(engine.rest_remaining_seconds(), Some(85));
    }

    #[test]
    fn test_complete_set_without_rpe_is_identity() {
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        engine
            .add_exercise("Squat", Some(ExerciseSet::new(100.0, 5, 120)))
            .unwrap();

        let rec = engine.complete_set("Squat", 1, None).unwrap();
        assert_eq!(rec.weight, 100.0);
        assert_eq!(rec.reps, 5);
        assert_eq!(rec.rest_seconds, 120);
    }

    #[test]
    fn test_complete_set_missing_target() {
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        engine
            .add_exercise("Squat", Some(ExerciseSet::new(100.0, 5, 120)))
            .unwrap();

        assert!(matches!(
            engine.complete_set("Squat", 3, None),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            engine.complete_set("Deadlift", 1, None),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_operations_require_active_session() {
        let mut engine = create_engine();
        assert!(matches!(
            engine.add_exercise("Squat", None),
            Err(Error::InvalidTransition(_))
        ));
        assert!(matches!(
            engine.complete_set("Squat", 1, None),
            Err(Error::InvalidTransition(_))
        ));
        assert!(matches!(
            engine.resume_existing(),
            Err(Error::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_duplicate_exercise_surfaced() {
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        engine.add_exercise("Bench Press", None).unwrap();

        assert!(matches!(
            engine.add_exercise("Bench Press", None),
            Err(Error::DuplicateExercise(_))
        ));
    }

    #[test]
    fn test_finish_with_nothing_to_save() {
        // Scenario C: zero completed sets, save requested
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        engine
            .add_exercise("Bench Press", Some(ExerciseSet::new(60.0, 8, 90)))
            .unwrap();

        let result = engine.finish(SaveDecision::Save);
        assert!(matches!(result, Err(Error::NothingToSave)));
        // Session remains active, nothing persisted
        assert_eq!(engine.status(), SessionStatus::Active);
    }

    #[test]
    fn test_finish_saves_and_completes() {
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        engine
            .add_exercise("Bench Press", Some(ExerciseSet::new(50.0, 10, 60)))
            .unwrap();
        engine.complete_set("Bench Press", 1, Some(7)).unwrap();

        let outcome = engine.finish(SaveDecision::Save).unwrap();
        match outcome {
            FinishOutcome::Saved { summary, .. } => {
                assert_eq!(summary.total_volume, 500.0);
                assert_eq!(summary.completed_sets, 1);
            }
            FinishOutcome::Discarded => panic!("expected a save"),
        }
        assert_eq!(engine.status(), SessionStatus::Completed);
    }

    #[test]
    fn test_finish_discard_terminates_without_saving() {
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        engine
            .add_exercise("Bench Press", Some(ExerciseSet::new(50.0, 10, 60)))
            .unwrap();
        engine.complete_set("Bench Press", 1, None).unwrap();

        let outcome = engine.finish(SaveDecision::Discard).unwrap();
        assert!(matches!(outcome, FinishOutcome::Discarded));
        assert_eq!(engine.status(), SessionStatus::Terminated);
    }

    #[test]
    fn test_failed_save_stays_completing_then_retry_succeeds() {
        let mut store = MemoryStore::new();
        store.fail_next_saves = 1;
        let mut engine = create_engine_with_store(store);

        engine.start(config()).unwrap();
        engine
            .add_exercise("Squat", Some(ExerciseSet::new(80.0, 5, 120)))
            .unwrap();
        engine.complete_set("Squat", 1, None).unwrap();

        let result = engine.finish(SaveDecision::Save);
        assert!(matches!(result, Err(Error::Persistence(_))));
        // Never marked completed without adapter confirmation
        assert_eq!(engine.status(), SessionStatus::Completing);

        // Retrying the save resolves the session
        let outcome = engine.finish(SaveDecision::Save).unwrap();
        assert!(matches!(outcome, FinishOutcome::Saved { .. }));
        assert_eq!(engine.status(), SessionStatus::Completed);
    }

    #[test]
    fn test_failed_save_can_be_abandoned() {
        let mut store = MemoryStore::new();
        store.fail_next_saves = u32::MAX;
        let mut engine = create_engine_with_store(store);

        engine.start(config()).unwrap();
        engine
            .add_exercise("Squat", Some(ExerciseSet::new(80.0, 5, 120)))
            .unwrap();
        engine.complete_set("Squat", 1, None).unwrap();

        assert!(engine.finish(SaveDecision::Save).is_err());
        let outcome = engine.finish(SaveDecision::Discard).unwrap();
        assert!(matches!(outcome, FinishOutcome::Discarded));
        assert_eq!(engine.status(), SessionStatus::Terminated);
    }

    #[test]
    fn test_tick_advances_clock_and_rest_timer() {
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        engine
            .add_exercise("Bench Press", Some(ExerciseSet::new(60.0, 8, 3)))
            .unwrap();

        engine.tick();
        assert_eq!(engine.elapsed_seconds(), 1);

        // Completing with RPE 7 keeps the 3s rest; drive it to completion
        engine.complete_set("Bench Press", 1, Some(7)).unwrap();
        let mut completed = false;
        for _ in 0..3 {
            for event in engine.tick() {
                if event == EngineEvent::Rest(RestTimerEvent::Completed) {
                    completed = true;
                }
            }
        }
        assert!(completed);
        assert_eq!(engine.rest_remaining_seconds(), None);
        assert_eq!(engine.elapsed_seconds(), 4);
    }

    #[test]
    fn test_visibility_suspends_clock_but_not_rest_timer() {
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        engine
            .add_exercise("Bench Press", Some(ExerciseSet::new(60.0, 8, 60)))
            .unwrap();
        engine.complete_set("Bench Press", 1, Some(7)).unwrap();

        engine.tick();
        engine.on_hidden();
        engine.tick();
        engine.tick();

        // Clock held at 1s, status still active, rest timer kept counting
        assert_eq!(engine.elapsed_seconds(), 1);
        assert_eq!(engine.status(), SessionStatus::Active);
        assert_eq!(engine.rest_remaining_seconds(), Some(57));

        engine.on_visible();
        engine.tick();
        assert_eq!(engine.elapsed_seconds(), 2);
    }

    #[test]
    fn test_restore_corrupt_snapshot_forces_reset() {
        // Scenario D: active, no config, no exercises
        let mut engine = create_engine();
        let snapshot = SessionSnapshot {
            id: Uuid::new_v4(),
            status: SessionStatus::Active,
            training_config: None,
            started_at: None,
            elapsed_seconds: 0.0,
            clock_suspended: false,
            exercises: vec![],
            last_active_route: None,
        };

        let result = engine.restore(snapshot);
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(engine.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_restore_repairable_snapshot_resumes() {
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        engine
            .add_exercise("Bench Press", Some(ExerciseSet::new(60.0, 8, 90)))
            .unwrap();
        for _ in 0..30 {
            engine.tick();
        }
        let mut snapshot = engine.snapshot();
        snapshot.elapsed_seconds = -10.0; // stale/hostile persisted value

        let mut engine2 = create_engine();
        engine2.restore(snapshot).unwrap();
        assert_eq!(engine2.status(), SessionStatus::Active);
        assert_eq!(engine2.elapsed_seconds(), 0); // repaired

        // Clock resumes counting from the repaired value
        engine2.tick();
        assert_eq!(engine2.elapsed_seconds(), 1);
    }

    #[test]
    fn test_resume_existing_keeps_elapsed() {
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        for _ in 0..5 {
            engine.tick();
        }

        engine.resume_existing().unwrap();
        assert_eq!(engine.elapsed_seconds(), 5);
        engine.tick();
        assert_eq!(engine.elapsed_seconds(), 6);
    }

    #[test]
    fn test_last_active_route_travels_with_snapshot() {
        let mut engine = create_engine();
        engine.start(config()).unwrap();
        engine.set_last_active_route("/workout/active");

        let snap = engine.snapshot();
        assert_eq!(snap.last_active_route.as_deref(), Some("/workout/active"));

        let mut engine2 = create_engine();
        engine2.restore(snap).unwrap();
        assert_eq!(
            engine2.snapshot().last_active_route.as_deref(),
            Some("/workout/active")
        );
    }

    #[test]
    fn test_subscribers_see_snapshots() {
        let seen: Rc<RefCell<Vec<SessionStatus>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut engine = create_engine();
        engine.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.status));

        engine.start(config()).unwrap();
        engine
            .add_exercise("Bench Press", Some(ExerciseSet::new(60.0, 8, 90)))
            .unwrap();
        engine.reset();

        let statuses = seen.borrow();
        assert_eq!(
            *statuses,
            vec![
                SessionStatus::Active,
                SessionStatus::Active,
                SessionStatus::Idle
            ]
        );
    }

    #[test]
    fn test_mutations_journaled_through_adapter() {
        // The engine owns the adapter, so journaling is observed through a
        // shared handle into the store
        #[derive(Default)]
        struct SharedStore {
            inner: Rc<RefCell<MemoryStore>>,
        }
        impl PersistenceAdapter for SharedStore {
            fn save_session(&mut self, snapshot: &SessionSnapshot) -> Result<Uuid> {
                self.inner.borrow_mut().save_session(snapshot)
            }
            fn save_set_mutation(
                &mut self,
                session_id: Uuid,
                exercise: &str,
                set_number: u32,
                patch: &SetPatch,
            ) -> Result<()> {
                self.inner
                    .borrow_mut()
                    .save_set_mutation(session_id, exercise, set_number, patch)
            }
            fn load_history(
                &self,
                filter: &crate::HistoryFilter,
            ) -> Result<Vec<crate::CompletedSession>> {
                self.inner.borrow().load_history(filter)
            }
        }

        let inner: Rc<RefCell<MemoryStore>> = Rc::default();
        let mut engine = SessionEngine::new(
            Box::new(SharedStore {
                inner: Rc::clone(&inner),
            }),
            build_default_catalog(),
            EngineOptions::default(),
        );

        engine.start(config()).unwrap();
        engine
            .add_exercise("Bench Press", Some(ExerciseSet::new(60.0, 8, 90)))
            .unwrap();
        engine.complete_set("Bench Press", 1, Some(6)).unwrap();

        let store = inner.borrow();
        assert_eq!(store.mutations.len(), 1);
        assert_eq!(store.mutations[0].exercise, "Bench Press");
        assert_eq!(store.mutations[0].patch.completed, Some(true));
        assert_eq!(store.mutations[0].patch.rpe, Some(6));
    }
}
