//! Active-session snapshot persistence with file locking.
//!
//! The engine's current snapshot is written after mutating operations so an
//! interrupted session (crash, backgrounded tab, navigation away) can be
//! offered for resume. A corrupt or unreadable file degrades to "no
//! resumable session" with a warning; the validator decides what to do with
//! whatever is loaded.

use crate::{Result, SessionSnapshot};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Load a persisted session snapshot with shared locking
///
/// Returns `None` if no snapshot exists or the file cannot be read/parsed.
pub fn load_snapshot(path: &Path) -> Result<Option<SessionSnapshot>> {
    if !path.exists() {
        tracing::debug!("No session snapshot at {:?}", path);
        return Ok(None);
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(
                "Unable to open session snapshot {:?}: {}. Treating as absent.",
                path,
                e
            );
            return Ok(None);
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!(
            "Unable to lock session snapshot {:?}: {}. Treating as absent.",
            path,
            e
        );
        return Ok(None);
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!(
            "Failed to read session snapshot {:?}: {}. Treating as absent.",
            path,
            e
        );
        return Ok(None);
    }

    file.unlock()?;

    match serde_json::from_str::<SessionSnapshot>(&contents) {
        Ok(snapshot) => {
            tracing::debug!("Loaded session snapshot from {:?}", path);
            Ok(Some(snapshot))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse session snapshot {:?}: {}. Treating as absent.",
                path,
                e
            );
            Ok(None)
        }
    }
}

/// Save a session snapshot with exclusive locking
///
/// Atomically writes by:
/// 1. Writing to a temp file
/// 2. Syncing to disk
/// 3. Renaming over the original
pub fn save_snapshot(snapshot: &SessionSnapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Create unique temp file in the same directory for atomic rename
    let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "snapshot path missing parent")
    })?)?;

    // Exclusive lock on the temp file serializes concurrent writers
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(snapshot)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| crate::Error::Io(e.error))?;

    tracing::debug!("Saved session snapshot to {:?}", path);
    Ok(())
}

/// Remove a persisted snapshot after the session finished or was reset.
/// Missing files are fine; the goal state is "nothing to resume".
pub fn clear_snapshot(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Cleared session snapshot at {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExerciseEntry, ExerciseSet, SessionStatus, TrainingConfig};
    use chrono::Utc;
    use uuid::Uuid;

    fn snapshot() -> SessionSnapshot {
        let mut entry = ExerciseEntry::new("Squat");
        entry.sets.push(ExerciseSet::new(80.0, 5, 120));
        SessionSnapshot {
            id: Uuid::new_v4(),
            status: SessionStatus::Active,
            training_config: Some(TrainingConfig {
                training_type: "strength".into(),
                target_duration_minutes: 45,
                body_focus: vec!["legs".into()],
                tags: vec![],
                recommended_exercises: vec![],
            }),
            started_at: Some(Utc::now()),
            elapsed_seconds: 300.0,
            clock_suspended: false,
            exercises: vec![entry],
            last_active_route: Some("/workout/active".into()),
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");

        let snap = snapshot();
        save_snapshot(&snap, &path).unwrap();

        let loaded = load_snapshot(&path).unwrap().unwrap();
        assert_eq!(loaded.id, snap.id);
        assert_eq!(loaded.status, SessionStatus::Active);
        assert_eq!(loaded.elapsed_seconds, 300.0);
        assert_eq!(loaded.last_active_route.as_deref(), Some("/workout/active"));
    }

    #[test]
    fn test_load_nonexistent_returns_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let loaded = load_snapshot(&temp_dir.path().join("missing.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupted_snapshot_treated_as_absent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let loaded = load_snapshot(&path).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_is_editing_flag_not_persisted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");

        let mut snap = snapshot();
        snap.exercises[0].sets[0].is_editing = true;
        save_snapshot(&snap, &path).unwrap();

        let loaded = load_snapshot(&path).unwrap().unwrap();
        assert!(!loaded.exercises[0].sets[0].is_editing);
    }

    #[test]
    fn test_clear_snapshot_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");

        save_snapshot(&snapshot(), &path).unwrap();
        clear_snapshot(&path).unwrap();
        assert!(!path.exists());

        // Clearing again is fine
        clear_snapshot(&path).unwrap();
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");

        save_snapshot(&snapshot(), &path).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "session.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only session.json, found extras: {:?}",
            extras
        );
    }
}
