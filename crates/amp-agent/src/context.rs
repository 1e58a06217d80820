use std::fmt;
use std::sync::Arc;

use amp_runlog::RunLogger;
use amp_types::ProjectId;
use serde::{Deserialize, Serialize};

use crate::model::ModelProvider;

/// User recorded on runs started from the local CLI.
pub const DEFAULT_USER: &str = "user_local";

/// A tool an engine may call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Everything an engine needs for one turn.
#[derive(Clone)]
pub struct AgentContext {
    pub project_id: ProjectId,
    pub user_id: String,
    pub input: String,
    pub tools: Vec<ToolDescriptor>,
    pub model: Arc<dyn ModelProvider>,
    pub logger: Arc<dyn RunLogger>,
}

impl AgentContext {
    /// Context for the local user with no tools.
    pub fn new(
        project_id: ProjectId,
        input: impl Into<String>,
        model: Arc<dyn ModelProvider>,
        logger: Arc<dyn RunLogger>,
    ) -> Self {
        Self {
            project_id,
            user_id: DEFAULT_USER.to_string(),
            input: input.into(),
            tools: Vec::new(),
            model,
            logger,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }
}

impl fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentContext")
            .field("project_id", &self.project_id)
            .field("user_id", &self.user_id)
            .field("input", &self.input)
            .field("tools", &self.tools)
            .field("model", &self.model.id())
            .finish_non_exhaustive()
    }
}
