use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use amp_types::{ProjectId, RunId};
use tracing::{debug, warn};

use crate::error::{Result, RunLogError};
use crate::event::RunEvent;
use crate::logger::RunLogger;

/// Subdirectory of the data root holding run logs.
pub const RUNS_DIR: &str = "runs";

/// JSONL run logger backed by an append-only file.
///
/// Each event is serialized on its own line and flushed immediately, so a
/// crash loses at most the line being written. Readers skip lines that do not
/// parse.
pub struct FileRunLogger {
    path: PathBuf,
    run_id: RunId,
    project_id: Option<ProjectId>,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl FileRunLogger {
    /// Open `<data_dir>/runs/<runId>.jsonl` for appending, creating it if needed.
    pub fn create(data_dir: &Path, run_id: RunId, project_id: Option<ProjectId>) -> Result<Self> {
        let dir = data_dir.join(RUNS_DIR);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{run_id}.jsonl"));

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "run log opened");

        Ok(Self {
            path,
            run_id,
            project_id,
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Append one event. Unlike [`RunLogger::event`], errors are returned.
    pub fn append(&self, kind: &str, payload: Option<serde_json::Value>) -> Result<()> {
        let ev = RunEvent::now(self.run_id.clone(), self.project_id.clone(), kind, payload);
        let line = serde_json::to_string(&ev)?;

        let mut guard = self.writer.lock().expect("run log mutex poisoned");
        let w = guard.as_mut().ok_or(RunLogError::Closed)?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    }

    /// Flush, sync and close the file. Later events are rejected.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.writer.lock().expect("run log mutex poisoned");
        if let Some(mut w) = guard.take() {
            w.flush()?;
            w.get_ref().sync_all()?;
            debug!(path = %self.path.display(), "run log closed");
        }
        Ok(())
    }
}

impl RunLogger for FileRunLogger {
    fn event(&self, kind: &str, payload: Option<serde_json::Value>) {
        if let Err(e) = self.append(kind, payload) {
            warn!(run = %self.run_id, kind, error = %e, "failed to write run event");
        }
    }
}

impl std::fmt::Debug for FileRunLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRunLogger")
            .field("path", &self.path)
            .field("run_id", &self.run_id)
            .finish_non_exhaustive()
    }
}

/// Read every parseable event from a run log, in file order.
pub fn read_events(path: &Path) -> Result<Vec<RunEvent>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RunEvent>(&line) {
            Ok(ev) => events.push(ev),
            Err(e) => warn!(line = lineno + 1, error = %e, "skipping malformed run event"),
        }
    }

    debug!(count = events.len(), "run log read");
    Ok(events)
}
