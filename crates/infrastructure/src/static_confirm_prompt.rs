//! Confirmation prompt with a fixed answer. Logs every question to tracing
//! output.

use async_trait::async_trait;
use authconsole_application::ConfirmPrompt;
use authconsole_core::AppResult;
use tracing::info;

/// Confirmation prompt that always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticConfirmPrompt {
    answer: bool,
}

impl StaticConfirmPrompt {
    /// Creates a prompt answering `answer` to every question.
    #[must_use]
    pub fn new(answer: bool) -> Self {
        Self { answer }
    }
}

impl Default for StaticConfirmPrompt {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConfirmPrompt for StaticConfirmPrompt {
    async fn confirm(&self, message: &str) -> AppResult<bool> {
        info!(answer = self.answer, "--- CONFIRM (static) ---\n{}", message);

        Ok(self.answer)
    }
}
