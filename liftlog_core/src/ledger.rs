//! The set/exercise ledger: the ordered, mutable exercises-and-sets data
//! held by one session.
//!
//! All mutations are synchronous and total. Set numbers are the 1-based
//! positions within an exercise's set list, so numbering stays contiguous
//! across removals by construction. Removing the last set of an exercise
//! removes the exercise; a zero-set entry never survives a mutation.

use crate::{Error, ExerciseEntry, ExerciseSet, Result, SetPatch};

/// Ordered collection of exercises, each holding an ordered list of sets.
///
/// Exercise names are unique within the ledger, compared case-sensitively:
/// "Bench Press" and "bench press" are distinct entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ledger {
    entries: Vec<ExerciseEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<ExerciseEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ExerciseEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ExerciseEntry> {
        self.entries
    }

    pub fn exercise(&self, name: &str) -> Option<&ExerciseEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    fn exercise_mut(&mut self, name: &str) -> Option<&mut ExerciseEntry> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    /// Get a set by exercise name and 1-based set number
    pub fn set(&self, exercise: &str, set_number: u32) -> Option<&ExerciseSet> {
        if set_number == 0 {
            return None;
        }
        self.exercise(exercise)
            .and_then(|e| e.sets.get(set_number as usize - 1))
    }

    /// Append a new exercise entry, optionally seeded with a first set
    pub fn add_exercise(
        &mut self,
        name: impl Into<String>,
        initial_set: Option<ExerciseSet>,
    ) -> Result<()> {
        let name = name.into();
        if self.exercise(&name).is_some() {
            return Err(Error::DuplicateExercise(name));
        }

        let mut entry = ExerciseEntry::new(name);
        if let Some(set) = initial_set {
            entry.sets.push(set);
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Append a set to an exercise, returning its 1-based set number
    pub fn add_set(&mut self, exercise: &str, set: ExerciseSet) -> Result<u32> {
        let entry = self
            .exercise_mut(exercise)
            .ok_or_else(|| Error::NotFound(format!("exercise '{}'", exercise)))?;
        entry.sets.push(set);
        Ok(entry.sets.len() as u32)
    }

    /// Apply a partial update to a set
    pub fn update_set(&mut self, exercise: &str, set_number: u32, patch: &SetPatch) -> Result<()> {
        let set = self.set_mut(exercise, set_number)?;

        if let Some(weight) = patch.weight {
            set.weight = weight;
        }
        if let Some(reps) = patch.reps {
            set.reps = reps;
        }
        if let Some(rest) = patch.rest_seconds {
            set.rest_seconds = rest;
        }
        if let Some(completed) = patch.completed {
            set.completed = completed;
        }
        if let Some(rpe) = patch.rpe {
            set.rpe = Some(rpe);
        }
        Ok(())
    }

    /// Remove a set; remaining sets renumber. Removing the last set removes
    /// the exercise entry itself.
    pub fn remove_set(&mut self, exercise: &str, set_number: u32) -> Result<()> {
        let entry = self
            .exercise_mut(exercise)
            .ok_or_else(|| Error::NotFound(format!("exercise '{}'", exercise)))?;

        let index = set_number as usize;
        if index == 0 || index > entry.sets.len() {
            return Err(Error::NotFound(format!(
                "set {} of exercise '{}'",
                set_number, exercise
            )));
        }
        entry.sets.remove(index - 1);

        if entry.sets.is_empty() {
            let name = entry.name.clone();
            self.remove_exercise(&name);
        }
        Ok(())
    }

    /// Remove an exercise entirely. Idempotent: removing a name that is not
    /// present is a no-op, matching permissive UI deletion flows.
    pub fn remove_exercise(&mut self, name: &str) {
        self.entries.retain(|e| e.name != name);
    }

    pub fn set_mut(&mut self, exercise: &str, set_number: u32) -> Result<&mut ExerciseSet> {
        let entry = self
            .exercise_mut(exercise)
            .ok_or_else(|| Error::NotFound(format!("exercise '{}'", exercise)))?;
        if set_number == 0 {
            return Err(Error::NotFound(format!(
                "set 0 of exercise '{}'",
                entry.name
            )));
        }
        let name = entry.name.clone();
        entry
            .sets
            .get_mut(set_number as usize - 1)
            .ok_or_else(|| Error::NotFound(format!("set {} of exercise '{}'", set_number, name)))
    }

    /// Drop entries that hold no sets, returning how many were removed.
    /// Used by snapshot repair; entries created through the mutation API
    /// never reach this state.
    pub fn prune_empty_exercises(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.sets.is_empty());
        before - self.entries.len()
    }

    pub fn total_sets(&self) -> usize {
        self.entries.iter().map(|e| e.sets.len()).sum()
    }

    pub fn completed_sets(&self) -> usize {
        self.entries
            .iter()
            .flat_map(|e| &e.sets)
            .filter(|s| s.completed)
            .count()
    }
}
