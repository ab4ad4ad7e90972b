//! Metrics aggregation over session ledgers and workout history.
//!
//! Pure, stateless functions: volume, density, muscle-focus histogram,
//! time-of-day bucketing, composition breakdown, personal-record detection
//! and the training-quality score. A set counts toward volume only when it
//! is completed with positive reps and positive effective weight;
//! bodyweight movements substitute an estimated load (catalog load share
//! times athlete body weight) for the recorded weight.

use crate::{
    CatalogExercise, CompletedSession, ExerciseCatalog, ExerciseCategory, ExerciseEntry,
    ExerciseSet, MuscleGroup,
};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Estimated work time per completed set when true duration is unknown
pub const DEFAULT_WORK_SECONDS_PER_SET: u32 = 45;

// ============================================================================
// Volume and Density
// ============================================================================

/// The load a set actually moved: the recorded weight, or the estimated
/// bodyweight load when the recorded weight is zero and the catalog knows
/// the movement's load share.
pub fn effective_weight(
    set: &ExerciseSet,
    catalog_entry: Option<&CatalogExercise>,
    body_weight: f64,
) -> f64 {
    if set.weight > 0.0 {
        return set.weight;
    }
    catalog_entry
        .and_then(|e| e.bodyweight_load_share)
        .map(|share| share * body_weight)
        .unwrap_or(0.0)
}

/// A set is countable toward volume when completed with positive reps and
/// positive effective weight
pub fn is_countable(
    set: &ExerciseSet,
    catalog_entry: Option<&CatalogExercise>,
    body_weight: f64,
) -> bool {
    set.completed && set.reps > 0 && effective_weight(set, catalog_entry, body_weight) > 0.0
}

/// Volume contributed by one set: effective weight times reps, zero for
/// non-countable sets
pub fn set_volume(
    set: &ExerciseSet,
    catalog_entry: Option<&CatalogExercise>,
    body_weight: f64,
) -> f64 {
    if !is_countable(set, catalog_entry, body_weight) {
        return 0.0;
    }
    effective_weight(set, catalog_entry, body_weight) * f64::from(set.reps)
}

/// Total volume over all countable sets of a ledger
pub fn total_volume(
    exercises: &[ExerciseEntry],
    catalog: &ExerciseCatalog,
    body_weight: f64,
) -> f64 {
    exercises
        .iter()
        .flat_map(|entry| {
            let def = catalog.get(&entry.name);
            entry.sets.iter().map(move |s| set_volume(s, def, body_weight))
        })
        .sum()
}

/// Volume per minute. When the true duration is unknown, work time is
/// estimated as `completed_sets * work_seconds_per_set`.
pub fn density(
    volume: f64,
    duration_seconds: Option<u64>,
    completed_sets: usize,
    work_seconds_per_set: u32,
) -> f64 {
    let seconds = match duration_seconds {
        Some(s) if s > 0 => s,
        _ => completed_sets as u64 * u64::from(work_seconds_per_set),
    };
    if seconds == 0 {
        return 0.0;
    }
    volume / (seconds as f64 / 60.0)
}

// ============================================================================
// Histograms
// ============================================================================

/// Completed-set count per primary muscle group
pub fn muscle_focus(
    exercises: &[ExerciseEntry],
    catalog: &ExerciseCatalog,
) -> BTreeMap<MuscleGroup, u32> {
    let mut histogram = BTreeMap::new();
    for entry in exercises {
        let Some(def) = catalog.get(&entry.name) else {
            continue;
        };
        let completed = entry.sets.iter().filter(|s| s.completed).count() as u32;
        if completed == 0 {
            continue;
        }
        for muscle in &def.primary_muscles {
            *histogram.entry(*muscle).or_insert(0) += completed;
        }
    }
    histogram
}

/// Completed-set count per composition category. Exercises unknown to the
/// catalog are counted as compound, the dominant free-weight case.
pub fn composition(
    exercises: &[ExerciseEntry],
    catalog: &ExerciseCatalog,
) -> BTreeMap<ExerciseCategory, u32> {
    let mut histogram = BTreeMap::new();
    for entry in exercises {
        let category = catalog
            .get(&entry.name)
            .map(|d| d.category)
            .unwrap_or(ExerciseCategory::Compound);
        let completed = entry.sets.iter().filter(|s| s.completed).count() as u32;
        if completed > 0 {
            *histogram.entry(category).or_insert(0) += completed;
        }
    }
    histogram
}

/// Time-of-day buckets for session occurrence
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// Bucket for a local hour-of-day: morning 5-11, afternoon 12-16,
/// evening 17-21, night 22-4
pub fn time_of_day_bucket(hour: u32) -> TimeOfDay {
    match hour {
        5..=11 => TimeOfDay::Morning,
        12..=16 => TimeOfDay::Afternoon,
        17..=21 => TimeOfDay::Evening,
        _ => TimeOfDay::Night,
    }
}

/// Accumulated session duration per time-of-day bucket, in the local zone
pub fn time_of_day_histogram(sessions: &[CompletedSession]) -> BTreeMap<TimeOfDay, u64> {
    time_of_day_histogram_in(sessions, &Local)
}

/// Accumulated session duration per time-of-day bucket in an explicit zone
pub fn time_of_day_histogram_in<Tz: TimeZone>(
    sessions: &[CompletedSession],
    tz: &Tz,
) -> BTreeMap<TimeOfDay, u64> {
    let mut histogram = BTreeMap::new();
    for session in sessions {
        let hour = session.started_at.with_timezone(tz).hour();
        *histogram.entry(time_of_day_bucket(hour)).or_insert(0) += session.duration_seconds;
    }
    histogram
}

// ============================================================================
// Personal Records
// ============================================================================

/// One new-maximum event for an exercise
#[derive(Clone, Debug, PartialEq)]
pub struct PersonalRecord {
    pub exercise: String,
    pub weight: f64,
    pub achieved_at: DateTime<Utc>,
    /// Percent improvement over the immediately preceding maximum;
    /// `None` for the first recorded maximum of an exercise
    pub improvement_percent: Option<f64>,
}

/// Detect personal records across a workout history.
///
/// Sessions are ordered chronologically; for each exercise name the running
/// maximum completed-set weight (> 0) is tracked, and every strict increase
/// is a record. Ties never count as a new record.
pub fn personal_records(sessions: &[CompletedSession]) -> Vec<PersonalRecord> {
    let mut ordered: Vec<&CompletedSession> = sessions.iter().collect();
    ordered.sort_by_key(|s| s.started_at);

    let mut best: HashMap<String, f64> = HashMap::new();
    let mut records = Vec::new();

    for session in ordered {
        for entry in &session.exercises {
            let session_max = entry
                .sets
                .iter()
                .filter(|s| s.completed && s.weight > 0.0)
                .map(|s| s.weight)
                .fold(f64::NEG_INFINITY, f64::max);
            if session_max <= 0.0 || !session_max.is_finite() {
                continue;
            }

            match best.get(&entry.name) {
                None => {
                    best.insert(entry.name.clone(), session_max);
                    records.push(PersonalRecord {
                        exercise: entry.name.clone(),
                        weight: session_max,
                        achieved_at: session.started_at,
                        improvement_percent: None,
                    });
                }
                Some(&previous) if session_max > previous => {
                    let improvement = (session_max - previous) / previous * 100.0;
                    best.insert(entry.name.clone(), session_max);
                    records.push(PersonalRecord {
                        exercise: entry.name.clone(),
                        weight: session_max,
                        achieved_at: session.started_at,
                        improvement_percent: Some(improvement),
                    });
                }
                _ => {}
            }
        }
    }

    records
}

// ============================================================================
// Training-Quality Score
// ============================================================================

/// Sub-scores of the 0-100 training-quality blend. Each component is
/// clamped to [0, 100] before weighting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityScore {
    pub consistency: f64,
    pub volume: f64,
    pub variety: f64,
    pub intensity: f64,
}

impl QualityScore {
    /// Weighted blend: consistency 40%, volume 30%, variety 20%,
    /// intensity 10%
    pub fn total(&self) -> f64 {
        0.4 * self.consistency + 0.3 * self.volume + 0.2 * self.variety + 0.1 * self.intensity
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Consecutive workout days counting back from the most recent workout date
pub fn streak_days(dates: &BTreeSet<NaiveDate>) -> u32 {
    let Some(&latest) = dates.iter().next_back() else {
        return 0;
    };
    let mut streak = 1;
    let mut day = latest;
    while let Some(previous) = day.pred_opt() {
        if !dates.contains(&previous) {
            break;
        }
        streak += 1;
        day = previous;
    }
    streak
}

/// Compute the training-quality score over a workout history.
///
/// `weekly_volume_target` is the athlete's configured weekly volume goal;
/// the volume component compares the trailing 7 days against it, and the
/// intensity component compares the trailing 7 days against the 7 before.
pub fn quality_score(
    sessions: &[CompletedSession],
    now: DateTime<Utc>,
    catalog: &ExerciseCatalog,
    body_weight: f64,
    weekly_volume_target: f64,
) -> QualityScore {
    if sessions.is_empty() {
        return QualityScore {
            consistency: 0.0,
            volume: 0.0,
            variety: 0.0,
            intensity: clamp_score(50.0),
        };
    }

    let dates: BTreeSet<NaiveDate> = sessions.iter().map(|s| s.started_at.date_naive()).collect();
    let consistency = clamp_score(f64::from(streak_days(&dates)) * 15.0 + 40.0);

    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);

    let volume_in = |from: DateTime<Utc>, to: DateTime<Utc>| -> f64 {
        sessions
            .iter()
            .filter(|s| s.started_at > from && s.started_at <= to)
            .map(|s| total_volume(&s.exercises, catalog, body_weight))
            .sum()
    };

    let this_week = volume_in(week_ago, now);
    let prior_week = volume_in(two_weeks_ago, week_ago);

    let volume = if weekly_volume_target > 0.0 {
        clamp_score(this_week / weekly_volume_target * 100.0)
    } else {
        0.0
    };

    let unique_exercises: BTreeSet<&str> = sessions
        .iter()
        .flat_map(|s| s.exercises.iter().map(|e| e.name.as_str()))
        .collect();
    let variety = clamp_score(unique_exercises.len() as f64 / sessions.len() as f64 * 50.0);

    let change_percent = if prior_week > 0.0 {
        (this_week - prior_week) / prior_week * 100.0
    } else {
        0.0
    };
    let intensity = clamp_score(50.0 + change_percent);

    QualityScore {
        consistency,
        volume,
        variety,
        intensity,
    }
}

// ============================================================================
// Session Summary
// ============================================================================

/// On-demand aggregate for one session, produced when a session finishes
#[derive(Clone, Debug)]
pub struct SessionSummary {
    pub total_volume: f64,
    pub density: f64,
    pub completed_sets: usize,
    pub muscle_focus: BTreeMap<MuscleGroup, u32>,
    pub composition: BTreeMap<ExerciseCategory, u32>,
}

pub fn session_summary(
    exercises: &[ExerciseEntry],
    elapsed_seconds: u64,
    catalog: &ExerciseCatalog,
    body_weight: f64,
    work_seconds_per_set: u32,
) -> SessionSummary {
    let completed_sets = exercises
        .iter()
        .flat_map(|e| &e.sets)
        .filter(|s| s.completed)
        .count();
    let volume = total_volume(exercises, catalog, body_weight);
    let duration = if elapsed_seconds > 0 {
        Some(elapsed_seconds)
    } else {
        None
    };

    SessionSummary {
        total_volume: volume,
        density: density(volume, duration, completed_sets, work_seconds_per_set),
        completed_sets,
        muscle_focus: muscle_focus(exercises, catalog),
        composition: composition(exercises, catalog),
    }
}
