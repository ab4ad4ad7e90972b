//! CSV rollup functionality for archiving logged sessions.
//!
//! The JSONL session log grows one line per finished workout; rollup moves
//! those rows into a long-term CSV archive atomically so no session is lost
//! between the two files.

use crate::{CompletedSession, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV archive. Exercise/set detail stays in the JSONL log
/// until rollup and is not carried into the archive.
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    training_type: String,
    started_at: String,
    completed_at: String,
    duration_seconds: u64,
    exercise_count: usize,
    completed_sets: usize,
}

impl From<&CompletedSession> for CsvRow {
    fn from(session: &CompletedSession) -> Self {
        CsvRow {
            id: session.id.to_string(),
            training_type: session.training_type.clone(),
            started_at: session.started_at.to_rfc3339(),
            completed_at: session.completed_at.to_rfc3339(),
            duration_seconds: session.duration_seconds,
            exercise_count: session.exercises.len(),
            completed_sets: session
                .exercises
                .iter()
                .flat_map(|e| &e.sets)
                .filter(|s| s.completed)
                .count(),
        }
    }
}

/// Roll up logged sessions into CSV and archive the log atomically
///
/// This function:
/// 1. Reads all sessions from the JSONL log
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the log to .processed
/// 5. Returns the number of sessions processed
///
/// # Safety
/// - CSV is fsynced before the log is renamed
/// - The log is renamed (not deleted) to allow manual recovery if needed
/// - Processed log files can be cleaned up separately
pub fn log_to_csv_and_archive(log_path: &Path, csv_path: &Path) -> Result<usize> {
    let sessions = crate::store::read_sessions(log_path)?;

    if sessions.is_empty() {
        tracing::info!("No sessions in log to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(csv_path)?;

    // Write headers only when the archive is brand new
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for session in &sessions {
        let row = CsvRow::from(session);
        writer.serialize(row)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} sessions to CSV", sessions.len());

    let processed_path = log_path.with_extension("wal.processed");
    std::fs::rename(log_path, &processed_path)?;

    tracing::info!("Archived session log to {:?}", processed_path);

    Ok(sessions.len())
}

/// Clean up old processed log files
///
/// This removes all .wal.processed files in the given directory.
pub fn cleanup_processed_logs(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed log: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed log files", count);
    }

    Ok(count)
}
