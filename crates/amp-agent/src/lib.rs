//! Agent collaborators for Amp.
//!
//! An [`AgentEngine`] takes one turn of a conversation given an
//! [`AgentContext`] and returns the produced messages plus references to any
//! artifacts it wrote. Engines talk to a language model only through the
//! [`ModelProvider`] trait and report progress only through the run logger
//! carried in the context.
//!
//! [`BasicEngine`] and [`EchoModel`] are the built-in implementations.

pub mod context;
pub mod engine;
pub mod error;
pub mod model;
pub mod runner;

pub use context::{AgentContext, ToolDescriptor, DEFAULT_USER};
pub use engine::{AgentEngine, AgentResult, ArtifactRef, BasicEngine, Message, Role};
pub use error::{AgentError, Result};
pub use model::{EchoModel, ModelProvider};
pub use runner::run_logged;
