use async_trait::async_trait;

use crate::context::LlmContext;
use crate::errors::GatewayError;
use crate::messages::AssistantMessage;

/// Options controlling one model query.
#[derive(Clone, Debug)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: None,
        }
    }
}

/// A language-model service. One call is one query; implementations must
/// not retry on their own.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;

    async fn complete(
        &self,
        context: &LlmContext,
        options: &CompletionOptions,
    ) -> Result<AssistantMessage, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_options_defaults() {
        let opts = CompletionOptions::default();
        assert_eq!(opts.max_tokens, 4096);
        assert!(opts.temperature.is_none());
    }
}
