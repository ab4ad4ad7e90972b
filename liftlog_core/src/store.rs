//! The persistence boundary of the session engine.
//!
//! The engine only ever talks to the [`PersistenceAdapter`] trait; it never
//! imports a concrete backend. Two implementations live here:
//! - [`JsonlStore`]: append-only JSON Lines files with file locking, one for
//!   finished sessions and one for the per-set mutation journal.
//! - [`MemoryStore`]: in-memory fake for engine tests, with a switch to
//!   simulate save failures.

use crate::{CompletedSession, HistoryFilter, Result, SessionSnapshot, SetPatch};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Narrow persistence contract consumed by the session engine.
///
/// Adapters never mutate session state; they read snapshots and return save
/// confirmations. The engine treats any adapter failure as a persistence
/// error and never assumes a retry happened.
pub trait PersistenceAdapter {
    /// Persist a finishing session, returning its stable identifier
    fn save_session(&mut self, snapshot: &SessionSnapshot) -> Result<Uuid>;

    /// Journal one set-level mutation of an in-progress session
    fn save_set_mutation(
        &mut self,
        session_id: Uuid,
        exercise: &str,
        set_number: u32,
        patch: &SetPatch,
    ) -> Result<()>;

    /// Load previously persisted sessions, oldest first
    fn load_history(&self, filter: &HistoryFilter) -> Result<Vec<CompletedSession>>;
}

/// One journaled set mutation
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SetMutationRecord {
    pub recorded_at: DateTime<Utc>,
    pub session_id: Uuid,
    pub exercise: String,
    pub set_number: u32,
    pub patch: SetPatch,
}

/// JSONL-backed persistence adapter with file locking
pub struct JsonlStore {
    sessions_path: PathBuf,
    mutations_path: PathBuf,
}

impl JsonlStore {
    pub fn new(sessions_path: impl Into<PathBuf>, mutations_path: impl Into<PathBuf>) -> Self {
        Self {
            sessions_path: sessions_path.into(),
            mutations_path: mutations_path.into(),
        }
    }

    fn append_line<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        // Acquire exclusive lock
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(value)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;
        Ok(())
    }
}

impl PersistenceAdapter for JsonlStore {
    fn save_session(&mut self, snapshot: &SessionSnapshot) -> Result<Uuid> {
        let record = CompletedSession::from_snapshot(snapshot, Utc::now());
        Self::append_line(&self.sessions_path, &record)?;
        tracing::debug!("Appended session {} to {:?}", record.id, self.sessions_path);
        Ok(record.id)
    }

    fn save_set_mutation(
        &mut self,
        session_id: Uuid,
        exercise: &str,
        set_number: u32,
        patch: &SetPatch,
    ) -> Result<()> {
        let record = SetMutationRecord {
            recorded_at: Utc::now(),
            session_id,
            exercise: exercise.to_string(),
            set_number,
            patch: patch.clone(),
        };
        Self::append_line(&self.mutations_path, &record)?;
        tracing::debug!(
            "Journaled mutation of {} set {} for session {}",
            exercise,
            set_number,
            session_id
        );
        Ok(())
    }

    fn load_history(&self, filter: &HistoryFilter) -> Result<Vec<CompletedSession>> {
        let mut sessions = read_sessions(&self.sessions_path)?;
        sessions.retain(|s| {
            filter.since.map(|since| s.started_at >= since).unwrap_or(true)
                && filter
                    .exercise
                    .as_ref()
                    .map(|name| s.exercises.iter().any(|e| &e.name == name))
                    .unwrap_or(true)
        });
        sessions.sort_by_key(|s| s.started_at);
        Ok(sessions)
    }
}

/// Read all sessions from a JSONL file
///
/// Malformed lines are logged and skipped, never fatal: a partial line from
/// a crashed writer must not take the history down with it.
pub fn read_sessions(path: &Path) -> Result<Vec<CompletedSession>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    // Acquire shared lock for reading
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut sessions = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<CompletedSession>(&line) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} sessions from {:?}", sessions.len(), path);
    Ok(sessions)
}

/// In-memory persistence adapter for tests
#[derive(Default)]
pub struct MemoryStore {
    pub sessions: Vec<CompletedSession>,
    pub mutations: Vec<SetMutationRecord>,
    /// Number of upcoming saves that fail with a persistence error
    pub fail_next_saves: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_failure(&mut self) -> Result<()> {
        if self.fail_next_saves > 0 {
            self.fail_next_saves -= 1;
            return Err(crate::Error::Persistence("simulated save failure".into()));
        }
        Ok(())
    }
}

impl PersistenceAdapter for MemoryStore {
    fn save_session(&mut self, snapshot: &SessionSnapshot) -> Result<Uuid> {
        self.take_failure()?;
        let record = CompletedSession::from_snapshot(snapshot, Utc::now());
        let id = record.id;
        self.sessions.push(record);
        Ok(id)
    }

    fn save_set_mutation(
        &mut self,
        session_id: Uuid,
        exercise: &str,
        set_number: u32,
        patch: &SetPatch,
    ) -> Result<()> {
        self.take_failure()?;
        self.mutations.push(SetMutationRecord {
            recorded_at: Utc::now(),
            session_id,
            exercise: exercise.to_string(),
            set_number,
            patch: patch.clone(),
        });
        Ok(())
    }

    fn load_history(&self, filter: &HistoryFilter) -> Result<Vec<CompletedSession>> {
        let mut sessions: Vec<CompletedSession> = self
            .sessions
            .iter()
            .filter(|s| filter.since.map(|since| s.started_at >= since).unwrap_or(true))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.started_at);
        Ok(sessions)
    }
}
