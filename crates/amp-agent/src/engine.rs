use amp_types::ItemId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::context::AgentContext;
use crate::error::Result;

/// Author of a message produced during a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    Tool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A version an engine wrote during its turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRef {
    pub item_id: ItemId,
    pub version: u32,
}

/// Output of one turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResult {
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactRef>,
}

impl AgentResult {
    /// Content of the first message, or empty.
    pub fn first_text(&self) -> &str {
        self.messages.first().map(|m| m.content.as_str()).unwrap_or("")
    }
}

/// A pluggable agent that can take one conversational turn.
#[async_trait]
pub trait AgentEngine: Send + Sync {
    fn id(&self) -> &str;
    fn capabilities(&self) -> Vec<String>;
    async fn run_turn(&self, ctx: &AgentContext) -> Result<AgentResult>;
}

/// Single-shot engine: forwards the input to the model and returns its reply.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicEngine;

impl BasicEngine {
    pub const ID: &'static str = "engine.basic";
}

#[async_trait]
impl AgentEngine for BasicEngine {
    fn id(&self) -> &str {
        Self::ID
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["chat".to_string(), "auto-approve".to_string()]
    }

    async fn run_turn(&self, ctx: &AgentContext) -> Result<AgentResult> {
        ctx.logger
            .event("model.called", Some(json!({ "input": ctx.input })));
        debug!(model = ctx.model.id(), project = %ctx.project_id, "basic engine turn");

        let reply = ctx.model.chat(&ctx.input).await?;
        Ok(AgentResult {
            messages: vec![Message::assistant(reply)],
            artifacts: Vec::new(),
        })
    }
}
