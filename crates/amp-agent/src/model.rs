use async_trait::async_trait;

use crate::error::Result;

/// A chat-capable language model.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> &str;
    async fn chat(&self, prompt: &str) -> Result<String>;
}

/// Model that replies with its prompt, prefixed by `ECHO: `.
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoModel;

impl EchoModel {
    pub const ID: &'static str = "model.echo";
}

#[async_trait]
impl ModelProvider for EchoModel {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        Ok(format!("ECHO: {prompt}"))
    }
}
