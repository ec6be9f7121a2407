use std::sync::Arc;

use authconsole_core::AppResult;
use authconsole_domain::{FormField, RowIndex};
use tracing::info;

use crate::authentication_form::{AuthenticationForm, SWITCH_AUTHENTICATION_WARNING};
use crate::popup_mediator::PopupMediator;
use crate::ui_ports::{ConfirmPrompt, EditorKind};

/// Result of submitting the authentication form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Fields to post.
    Submitted(Vec<FormField>),
    /// The user declined the authentication type switch.
    Cancelled,
}

/// Async edit and submit flows of the authentication form.
#[derive(Clone)]
pub struct AuthenticationFormService {
    popups: PopupMediator,
    confirm_prompt: Arc<dyn ConfirmPrompt>,
}

impl AuthenticationFormService {
    /// Creates the service.
    #[must_use]
    pub fn new(popups: PopupMediator, confirm_prompt: Arc<dyn ConfirmPrompt>) -> Self {
        Self {
            popups,
            confirm_prompt,
        }
    }

    /// Opens the editor of `kind` for `target` (or a new row) and incorporates
    /// the submitted payload.
    ///
    /// Returns the affected row index, or `None` when the editor was closed
    /// without submitting.
    pub async fn edit(
        &self,
        form: &mut AuthenticationForm,
        kind: EditorKind,
        target: Option<RowIndex>,
    ) -> AppResult<Option<RowIndex>> {
        let session = form.begin_edit(kind, target)?;
        let Some(payload) = self.popups.open_editor(kind, session.params).await? else {
            return Ok(None);
        };

        form.complete_edit(session.ticket, payload).map(Some)
    }

    /// Prepares the form for posting, asking for confirmation when the
    /// authentication type changed.
    pub async fn submit(&self, form: &mut AuthenticationForm) -> AppResult<SubmitOutcome> {
        let check = form.prepare_submit();
        if check.requires_confirmation
            && !self
                .confirm_prompt
                .confirm(SWITCH_AUTHENTICATION_WARNING)
                .await?
        {
            info!("authentication form submit cancelled at type switch confirmation");
            return Ok(SubmitOutcome::Cancelled);
        }

        let fields = form.form_fields();
        info!(fields = fields.len(), "authentication form submitted");
        Ok(SubmitOutcome::Submitted(fields))
    }
}
