use std::sync::Arc;

use authconsole_core::{AppError, AppResult};
use authconsole_domain::{FieldPath, FormField, MessageBox, ServerResponse};
use serde_json::Value;
use tracing::{info, warn};

use crate::ui_ports::{ConfirmPrompt, ServerGateway, ServerRequest};

/// Confirmation asked before deleting selected actions.
pub const DELETE_ACTIONS_CONFIRMATION: &str = "Delete selected actions?";

/// Mass delete issued from a list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MassDeleteRequest {
    /// Delete selected actions of one event source.
    Actions {
        /// Event source of the action list.
        eventsource: String,
        /// Selected action identifiers.
        actionids: Vec<String>,
    },
    /// Delete selected hosts.
    Hosts {
        /// Selected host identifiers.
        hostids: Vec<String>,
    },
}

impl MassDeleteRequest {
    fn ids(&self) -> &[String] {
        match self {
            Self::Actions { actionids, .. } => actionids,
            Self::Hosts { hostids } => hostids,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Actions { .. } => "actions",
            Self::Hosts { .. } => "hosts",
        }
    }

    fn server_request(&self) -> ServerRequest {
        match self {
            Self::Actions {
                eventsource,
                actionids,
            } => ServerRequest::new("action.delete")
                .with_query("eventsource", eventsource.as_str())
                .with_body(id_fields("g_actionid", actionids)),
            Self::Hosts { hostids } => {
                ServerRequest::new("host.massdelete").with_body(id_fields("hostids", hostids))
            }
        }
    }
}

fn id_fields<'a>(name: &str, ids: &'a [String]) -> impl Iterator<Item = FormField> + 'a {
    let path = FieldPath::new(name).append();
    ids.iter().map(move |id| FormField::new(&path, id.as_str()))
}

/// What the list page does after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Reload the page, showing `message` after the reload.
    Reload {
        /// Message carried over the reload.
        message: Option<MessageBox>,
    },
    /// Keep the page as it is and show `message`.
    Stay {
        /// Message to show.
        message: MessageBox,
    },
    /// The user declined; nothing was sent.
    Cancelled,
}

/// Network plumbing of the action and host list pages.
#[derive(Clone)]
pub struct ListPageService {
    gateway: Arc<dyn ServerGateway>,
    confirm_prompt: Arc<dyn ConfirmPrompt>,
}

impl ListPageService {
    /// Creates the service.
    #[must_use]
    pub fn new(gateway: Arc<dyn ServerGateway>, confirm_prompt: Arc<dyn ConfirmPrompt>) -> Self {
        Self {
            gateway,
            confirm_prompt,
        }
    }

    /// Deletes the selected rows and maps the server answer to a page outcome.
    ///
    /// Transport and parse failures keep the page and show the generic
    /// server error box.
    pub async fn mass_delete(&self, request: MassDeleteRequest) -> AppResult<PageOutcome> {
        if request.ids().is_empty() {
            return Err(AppError::Validation(format!(
                "no {} selected for deletion",
                request.label()
            )));
        }

        if matches!(request, MassDeleteRequest::Actions { .. })
            && !self
                .confirm_prompt
                .confirm(DELETE_ACTIONS_CONFIRMATION)
                .await?
        {
            return Ok(PageOutcome::Cancelled);
        }

        let response = self
            .gateway
            .post_form(request.server_request())
            .await
            .and_then(|body| ServerResponse::parse(body.as_str()));

        let response = match response {
            Ok(response) => response,
            Err(AppError::Transport(message)) => {
                warn!(
                    list = request.label(),
                    error = %message,
                    "mass delete failed in transport"
                );
                return Ok(PageOutcome::Stay {
                    message: MessageBox::unexpected_server_error(),
                });
            }
            Err(error) => return Err(error),
        };

        info!(
            list = request.label(),
            count = request.ids().len(),
            failed = response.is_failure(),
            "mass delete answered"
        );

        Ok(match request {
            MassDeleteRequest::Actions { .. } => action_list_outcome(response),
            MassDeleteRequest::Hosts { .. } => host_list_outcome(response),
        })
    }

    /// Maps the payload of a submitted edit dialogue to a page outcome.
    pub fn dialogue_submitted(&self, payload: &Value) -> AppResult<PageOutcome> {
        Ok(match ServerResponse::from_value(payload)? {
            ServerResponse::Success { title, messages }
            | ServerResponse::Completed { title, messages } => PageOutcome::Reload {
                message: Some(MessageBox::good(Some(title), messages)),
            },
            ServerResponse::Error { title, messages } => PageOutcome::Stay {
                message: MessageBox::bad(title, messages),
            },
            ServerResponse::RenderedErrors { html } => PageOutcome::Stay {
                message: MessageBox::bad(None, vec![html]),
            },
        })
    }

    /// Maps the payload of a delete issued from an edit dialogue; the page
    /// reloads in every case.
    #[must_use]
    pub fn dialogue_deleted(&self, payload: &Value) -> PageOutcome {
        let message = match ServerResponse::from_value(payload) {
            Ok(ServerResponse::Success { title, messages }) => {
                Some(MessageBox::good(Some(title), messages))
            }
            _ => None,
        };

        PageOutcome::Reload { message }
    }
}

fn action_list_outcome(response: ServerResponse) -> PageOutcome {
    let message = match response {
        ServerResponse::Error { title, messages } => Some(MessageBox::bad(title, messages)),
        ServerResponse::Success { title, messages } => {
            Some(MessageBox::good(Some(title), messages))
        }
        ServerResponse::RenderedErrors { .. } | ServerResponse::Completed { .. } => None,
    };

    PageOutcome::Reload { message }
}

fn host_list_outcome(response: ServerResponse) -> PageOutcome {
    match response {
        ServerResponse::RenderedErrors { html } => PageOutcome::Stay {
            message: MessageBox::bad(None, vec![html]),
        },
        ServerResponse::Error { title, messages } => PageOutcome::Stay {
            message: MessageBox::bad(title, messages),
        },
        ServerResponse::Success { title, messages }
        | ServerResponse::Completed { title, messages } => PageOutcome::Reload {
            message: Some(MessageBox::good(Some(title), messages)),
        },
    }
}

#[cfg(test)]
mod tests;
