use std::sync::Mutex;

use amp_types::{ProjectId, RunId};

use crate::event::RunEvent;

/// Sink for run events.
///
/// Implementations must not fail the caller: write errors are reported via
/// `tracing` and otherwise dropped.
pub trait RunLogger: Send + Sync {
    fn event(&self, kind: &str, payload: Option<serde_json::Value>);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopRunLogger;

impl RunLogger for NoopRunLogger {
    fn event(&self, _kind: &str, _payload: Option<serde_json::Value>) {}
}

/// Collects events in memory. Used by tests and embedders that inspect a run
/// after the fact.
#[derive(Debug)]
pub struct MemoryRunLogger {
    run_id: RunId,
    project_id: Option<ProjectId>,
    events: Mutex<Vec<RunEvent>>,
}

impl MemoryRunLogger {
    pub fn new(run_id: RunId, project_id: Option<ProjectId>) -> Self {
        Self {
            run_id,
            project_id,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().expect("run log mutex poisoned").clone()
    }

    /// Event kinds in the order they were recorded.
    pub fn kinds(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("run log mutex poisoned")
            .iter()
            .map(|e| e.kind.clone())
            .collect()
    }
}

impl RunLogger for MemoryRunLogger {
    fn event(&self, kind: &str, payload: Option<serde_json::Value>) {
        let ev = RunEvent::now(self.run_id.clone(), self.project_id.clone(), kind, payload);
        self.events.lock().expect("run log mutex poisoned").push(ev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_logger_keeps_order() {
        let log = MemoryRunLogger::new(RunId::from_raw("run_1"), None);
        log.event("a", None);
        log.event("b", Some(serde_json::json!(1)));
        assert_eq!(log.kinds(), vec!["a", "b"]);
        assert_eq!(log.events()[1].payload, Some(serde_json::json!(1)));
    }

    #[test]
    fn loggers_are_object_safe() {
        let loggers: Vec<Box<dyn RunLogger>> = vec![
            Box::new(NoopRunLogger),
            Box::new(MemoryRunLogger::new(RunId::from_raw("run_2"), None)),
        ];
        for l in &loggers {
            l.event("x", None);
        }
    }
}
