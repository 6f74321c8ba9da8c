//! Scripted text generator for tests: replays canned completions.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{InferenceError, InferenceResult};
use crate::inference::TextGenerator;

/// Returns queued completions in order and records every prompt.
///
/// When the queue runs dry, `generate` fails as if the backend were
/// unreachable.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<InferenceResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::default();
        for reply in replies {
            generator.push_reply(reply);
        }
        generator
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.replies).push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: InferenceError) {
        lock(&self.replies).push_back(Err(error));
    }

    /// Prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> InferenceResult<String> {
        lock(&self.prompts).push(prompt.to_string());
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Err(InferenceError::Transport("connection refused".into())))
    }
}
