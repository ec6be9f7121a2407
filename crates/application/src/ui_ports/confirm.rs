use async_trait::async_trait;
use authconsole_core::AppResult;

/// Port for yes/no confirmations shown before destructive or resetting actions.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    /// Asks the user to confirm `message`; `false` cancels the action.
    async fn confirm(&self, message: &str) -> AppResult<bool>;
}
