//! Run event logging for Amp.
//!
//! A run is one agent invocation. Every notable step of a run is recorded as
//! a [`RunEvent`] through the [`RunLogger`] trait. Logging is fire-and-forget:
//! a failed write is reported through `tracing` and never aborts the run.
//!
//! [`FileRunLogger`] appends one JSON object per line to
//! `<data_dir>/runs/<runId>.jsonl`.

pub mod error;
pub mod event;
pub mod file;
pub mod logger;

pub use error::{Result, RunLogError};
pub use event::RunEvent;
pub use file::{read_events, FileRunLogger, RUNS_DIR};
pub use logger::{MemoryRunLogger, NoopRunLogger, RunLogger};
