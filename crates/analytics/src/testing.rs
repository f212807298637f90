use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::llm::{LlmClient, LlmPrompt};

/// Replays canned replies in order and records every prompt it receives.
#[derive(Clone, Default)]
pub struct ScriptedLlm {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<LlmPrompt>>>,
    fallback: Option<String>,
}

impl ScriptedLlm {
    pub fn replying(fallback: &str) -> Self {
        Self { fallback: Some(fallback.to_string()), ..Self::default() }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn push_reply(self, reply: &str) -> Self {
        self.lock_replies().push_back(Ok(reply.to_string()));
        self
    }

    pub fn push_failure(self, message: &str) -> Self {
        self.lock_replies().push_back(Err(message.to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<LlmPrompt> {
        match self.prompts.lock() {
            Ok(prompts) => prompts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        match self.replies.lock() {
            Ok(replies) => replies,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &LlmPrompt) -> Result<String> {
        match self.prompts.lock() {
            Ok(mut prompts) => prompts.push(prompt.clone()),
            Err(poisoned) => poisoned.into_inner().push(prompt.clone()),
        }

        match self.lock_replies().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow!(message)),
            None => self.fallback.clone().ok_or_else(|| anyhow!("llm unavailable")),
        }
    }
}
