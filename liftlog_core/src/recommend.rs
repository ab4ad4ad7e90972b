//! RPE-driven recommendation for the next set of an exercise.
//!
//! Given a completed set and its perceived-exertion rating, produce the
//! prefill values (weight, reps, rest) for the following set:
//! - RPE <= 3: too easy, raise load and shorten rest
//! - RPE 4-6: moderate, small progression
//! - RPE 7-8: optimal, maintain
//! - RPE >= 9: too hard, back off and lengthen rest
//!
//! Without a rating, the recommendation is the identity: all three values
//! pass through unchanged.

use crate::ExerciseSet;

/// Minimum rest between sets, in seconds
pub const MIN_REST_SECONDS: u32 = 30;

/// Prefill values recommended for the next set
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SetRecommendation {
    pub weight: f64,
    pub reps: u32,
    pub rest_seconds: u32,
}

impl SetRecommendation {
    fn identity(set: &ExerciseSet) -> Self {
        Self {
            weight: set.weight,
            reps: set.reps,
            rest_seconds: set.rest_seconds,
        }
    }
}

/// Compute the next-set recommendation for a completed set.
///
/// Floors: weight at 0, reps at 1, rest at [`MIN_REST_SECONDS`]. Floors
/// apply only where a branch moves the value, so the maintain branch and
/// the unrated identity leave the set untouched.
pub fn next_set_recommendation(set: &ExerciseSet, rpe: Option<u8>) -> SetRecommendation {
    let Some(rpe) = rpe else {
        return SetRecommendation::identity(set);
    };

    match rpe {
        0..=3 => {
            // Too easy: raise load, shave rest. Smaller increment for
            // light loads where 2.5 kg would be a large jump.
            let increment = if set.weight < 10.0 { 1.25 } else { 2.5 };
            SetRecommendation {
                weight: set.weight + increment,
                reps: set.reps,
                rest_seconds: set.rest_seconds.saturating_sub(5).max(MIN_REST_SECONDS),
            }
        }
        4..=6 => {
            let increment = if set.weight < 20.0 { 0.5 } else { 1.25 };
            SetRecommendation {
                weight: set.weight + increment,
                reps: set.reps + 1,
                rest_seconds: set.rest_seconds,
            }
        }
        7..=8 => SetRecommendation::identity(set),
        _ => SetRecommendation {
            weight: (set.weight - 2.5).max(0.0),
            reps: set.reps.saturating_sub(1).max(1),
            rest_seconds: (set.rest_seconds + 15).max(MIN_REST_SECONDS),
        },
    }
}
