//! Default catalog of known exercises.
//!
//! The catalog supplies the muscle-group mapping, composition category and
//! bodyweight load estimates the metrics aggregator needs, and ranks
//! exercise recommendations for a training setup.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<ExerciseCatalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static ExerciseCatalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog of built-in exercises
///
/// **Note**: For production use, prefer `get_default_catalog()` which
/// returns a cached reference. This function is retained for testing and
/// custom catalog creation.
pub fn build_default_catalog() -> ExerciseCatalog {
    build_default_catalog_internal()
}

fn exercise(
    name: &str,
    category: ExerciseCategory,
    primary_muscles: &[MuscleGroup],
    bodyweight_load_share: Option<f64>,
    tags: &[&str],
) -> (String, CatalogExercise) {
    (
        name.to_string(),
        CatalogExercise {
            name: name.to_string(),
            category,
            primary_muscles: primary_muscles.to_vec(),
            bodyweight_load_share,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        },
    )
}

fn build_default_catalog_internal() -> ExerciseCatalog {
    use ExerciseCategory::*;
    use MuscleGroup::*;

    let exercises: HashMap<String, CatalogExercise> = [
        exercise(
            "Bench Press",
            Compound,
            &[Chest, Triceps, Shoulders],
            None,
            &["push", "upper", "barbell"],
        ),
        exercise(
            "Squat",
            Compound,
            &[Quads, Glutes, Hamstrings],
            None,
            &["legs", "lower", "barbell"],
        ),
        exercise(
            "Deadlift",
            Compound,
            &[Back, Hamstrings, Glutes],
            None,
            &["pull", "lower", "barbell"],
        ),
        exercise(
            "Overhead Press",
            Compound,
            &[Shoulders, Triceps],
            None,
            &["push", "upper", "barbell"],
        ),
        exercise(
            "Barbell Row",
            Compound,
            &[Back, Biceps],
            None,
            &["pull", "upper", "barbell"],
        ),
        exercise(
            "Lunge",
            Compound,
            &[Quads, Glutes],
            None,
            &["legs", "lower", "dumbbell"],
        ),
        exercise(
            "Bicep Curl",
            Isolation,
            &[Biceps],
            None,
            &["pull", "upper", "dumbbell"],
        ),
        exercise(
            "Tricep Extension",
            Isolation,
            &[Triceps],
            None,
            &["push", "upper", "dumbbell"],
        ),
        exercise(
            "Lateral Raise",
            Isolation,
            &[Shoulders],
            None,
            &["push", "upper", "dumbbell"],
        ),
        exercise(
            "Calf Raise",
            Isolation,
            &[Calves],
            None,
            &["legs", "lower"],
        ),
        exercise(
            "Pull-Up",
            Bodyweight,
            &[Back, Biceps],
            Some(0.95),
            &["pull", "upper", "bodyweight"],
        ),
        exercise(
            "Push-Up",
            Bodyweight,
            &[Chest, Triceps],
            Some(0.64),
            &["push", "upper", "bodyweight"],
        ),
        exercise(
            "Dip",
            Bodyweight,
            &[Chest, Triceps, Shoulders],
            Some(0.95),
            &["push", "upper", "bodyweight"],
        ),
        exercise(
            "Plank",
            Isometric,
            &[Core],
            Some(0.6),
            &["core", "bodyweight"],
        ),
        exercise(
            "Wall Sit",
            Isometric,
            &[Quads],
            Some(0.7),
            &["legs", "lower", "bodyweight"],
        ),
    ]
    .into_iter()
    .collect();

    ExerciseCatalog { exercises }
}

impl ExerciseCatalog {
    pub fn get(&self, name: &str) -> Option<&CatalogExercise> {
        self.exercises.get(name)
    }

    /// Rank catalog exercises for a set of body-focus tags, most relevant
    /// first. Compounds win ties so recommendations lead with the big
    /// movements; unmatched exercises are excluded.
    pub fn rank_for_focus(&self, body_focus: &[String], limit: usize) -> Vec<String> {
        let mut scored: Vec<(&CatalogExercise, usize)> = self
            .exercises
            .values()
            .map(|e| {
                let score = e
                    .tags
                    .iter()
                    .filter(|t| body_focus.iter().any(|f| f.eq_ignore_ascii_case(t.as_str())))
                    .count();
                (e, score)
            })
            .filter(|(_, score)| *score > 0)
            .collect();

        scored.sort_by(|(a, sa), (b, sb)| {
            sb.cmp(sa)
                .then_with(|| {
                    let a_compound = a.category == ExerciseCategory::Compound;
                    let b_compound = b.category == ExerciseCategory::Compound;
                    b_compound.cmp(&a_compound)
                })
                .then_with(|| a.name.cmp(&b.name))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(e, _)| e.name.clone())
            .collect()
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, def) in &self.exercises {
            if name.is_empty() || def.name.is_empty() {
                errors.push("Exercise has empty name".to_string());
            }
            if name != &def.name {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.name '{}'",
                    name, def.name
                ));
            }
            if def.primary_muscles.is_empty() {
                errors.push(format!("Exercise '{}' has no primary muscles", name));
            }
            if let Some(share) = def.bodyweight_load_share {
                if !(0.0..=1.5).contains(&share) || share == 0.0 {
                    errors.push(format!(
                        "Exercise '{}' has implausible bodyweight load share {}",
                        name, share
                    ));
                }
            }
            if matches!(
                def.category,
                ExerciseCategory::Bodyweight | ExerciseCategory::Isometric
            ) && def.bodyweight_load_share.is_none()
            {
                errors.push(format!(
                    "Bodyweight exercise '{}' is missing a load share",
                    name
                ));
            }
        }

        for category in [
            ExerciseCategory::Compound,
            ExerciseCategory::Isolation,
            ExerciseCategory::Bodyweight,
            ExerciseCategory::Isometric,
        ] {
            if !self.exercises.values().any(|e| e.category == category) {
                errors.push(format!("Catalog has no {:?} exercises", category));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.exercises.len(), 15);
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_bodyweight_exercises_carry_load_shares() {
        let catalog = build_default_catalog();
        for def in catalog.exercises.values() {
            if matches!(
                def.category,
                ExerciseCategory::Bodyweight | ExerciseCategory::Isometric
            ) {
                assert!(
                    def.bodyweight_load_share.is_some(),
                    "{} is missing a load share",
                    def.name
                );
            }
        }
    }

    #[test]
    fn test_rank_for_focus_prefers_compounds() {
        let catalog = build_default_catalog();
        let ranked = catalog.rank_for_focus(&["upper".into()], 4);

        assert_eq!(ranked.len(), 4);
        // Compounds outrank isolations at the same tag score
        let first = catalog.get(&ranked[0]).unwrap();
        assert_eq!(first.category, ExerciseCategory::Compound);
    }

    #[test]
    fn test_rank_for_focus_unmatched_focus_is_empty() {
        let catalog = build_default_catalog();
        let ranked = catalog.rank_for_focus(&["swimming".into()], 5);
        assert!(ranked.is_empty());
    }
}
