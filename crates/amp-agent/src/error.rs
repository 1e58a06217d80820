/// Errors produced by agent engines and model providers.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The model provider failed to produce a reply.
    #[error("model {model} failed: {message}")]
    Model { model: String, message: String },

    /// The engine could not complete the turn.
    #[error("engine {engine} failed: {message}")]
    Engine { engine: String, message: String },
}

/// Convenience alias used throughout the agent crate.
pub type Result<T> = std::result::Result<T, AgentError>;
