//! Scripted Generation Service

use async_trait::async_trait;
use persona_discovery::extraction::{
    GenerationError, GenerationOptions, GenerationOutput, GenerationService,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Generation Service replaying queued replies in order
///
/// An exhausted script answers with `Unavailable`.
#[derive(Default)]
pub struct ScriptedGeneration {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, error: GenerationError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedGeneration {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<GenerationOutput, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Unavailable("script exhausted".to_string())));
        reply.map(|text| GenerationOutput {
            tokens_used: text.len() as u32 / 4,
            text,
        })
    }
}
