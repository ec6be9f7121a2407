//! Scripted edits replayed against the authentication form.

use authconsole_application::{AuthenticationForm, AuthenticationFormService, EditorKind};
use authconsole_core::{AppError, AppResult};
use authconsole_domain::{AuthenticationType, FallbackStatus, RowIndex};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptEditor {
    LdapServer,
    SamlProvisionGroup,
    SamlProvisionMedia,
}

impl From<ScriptEditor> for EditorKind {
    fn from(value: ScriptEditor) -> Self {
        match value {
            ScriptEditor::LdapServer => Self::LdapServer,
            ScriptEditor::SamlProvisionGroup => Self::SamlProvisionGroup,
            ScriptEditor::SamlProvisionMedia => Self::SamlProvisionMedia,
        }
    }
}

/// One user interaction with the form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditStep {
    /// Open an editor; a missing `payload` dismisses it.
    Edit {
        editor: ScriptEditor,
        #[serde(default)]
        row: Option<RowIndex>,
        #[serde(default)]
        payload: Option<Value>,
    },
    RemoveLdapServer {
        row: RowIndex,
    },
    SetDefaultLdapServer {
        row: RowIndex,
    },
    RemoveSamlProvisionGroup {
        row: RowIndex,
    },
    RemoveSamlProvisionMedia {
        row: RowIndex,
    },
    ToggleFallbackStatus {
        status: FallbackStatus,
    },
    /// Drop order of the regular group rows.
    ReorderSamlProvisionGroups {
        rows: Vec<RowIndex>,
    },
    SetAuthenticationType {
        authentication_type: AuthenticationType,
    },
    SetSamlEnabled {
        enabled: bool,
    },
    SetSamlProvisionStatus {
        enabled: bool,
    },
    SetSetting {
        name: String,
        value: String,
    },
}

pub fn parse_script(text: &str) -> AppResult<Vec<EditStep>> {
    serde_json::from_str(text)
        .map_err(|error| AppError::Validation(format!("invalid edit script: {error}")))
}

/// Editor answers in the order the script opens editors.
pub fn editor_answers(steps: &[EditStep]) -> Vec<Option<Value>> {
    steps
        .iter()
        .filter_map(|step| match step {
            EditStep::Edit { payload, .. } => Some(payload.clone()),
            _ => None,
        })
        .collect()
}

pub async fn apply_steps(
    service: &AuthenticationFormService,
    form: &mut AuthenticationForm,
    steps: Vec<EditStep>,
) -> AppResult<()> {
    for (position, step) in steps.into_iter().enumerate() {
        apply_step(service, form, step)
            .await
            .map_err(|error| prefix_step(position, error))?;
    }

    Ok(())
}

async fn apply_step(
    service: &AuthenticationFormService,
    form: &mut AuthenticationForm,
    step: EditStep,
) -> AppResult<()> {
    match step {
        EditStep::Edit { editor, row, .. } => {
            let kind = EditorKind::from(editor);
            match service.edit(form, kind, row).await? {
                Some(index) => info!(editor = %kind, row = %index, "editor submitted"),
                None => info!(editor = %kind, "editor dismissed"),
            }
            Ok(())
        }
        EditStep::RemoveLdapServer { row } => form.remove_ldap_server(row),
        EditStep::SetDefaultLdapServer { row } => form.set_default_ldap_server(row),
        EditStep::RemoveSamlProvisionGroup { row } => form.remove_saml_provision_group(row),
        EditStep::RemoveSamlProvisionMedia { row } => form.remove_saml_provision_media(row),
        EditStep::ToggleFallbackStatus { status } => form.toggle_fallback_status(status),
        EditStep::ReorderSamlProvisionGroups { rows } => {
            form.reorder_saml_provision_groups(&rows)
        }
        EditStep::SetAuthenticationType {
            authentication_type,
        } => {
            form.set_authentication_type(authentication_type);
            Ok(())
        }
        EditStep::SetSamlEnabled { enabled } => {
            form.set_saml_enabled(enabled);
            Ok(())
        }
        EditStep::SetSamlProvisionStatus { enabled } => {
            form.set_saml_provision_status(enabled);
            Ok(())
        }
        EditStep::SetSetting { name, value } => form.set_setting(name, value),
    }
}

fn prefix_step(position: usize, error: AppError) -> AppError {
    match error {
        AppError::Validation(message) => {
            AppError::Validation(format!("step {position}: {message}"))
        }
        AppError::NotFound(message) => AppError::NotFound(format!("step {position}: {message}")),
        AppError::Conflict(message) => AppError::Conflict(format!("step {position}: {message}")),
        AppError::Forbidden(message) => {
            AppError::Forbidden(format!("step {position}: {message}"))
        }
        other => other,
    }
}
