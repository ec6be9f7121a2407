use std::sync::Arc;

use async_trait::async_trait;
use authconsole_core::{AppError, AppResult};
use authconsole_domain::{MessageBox, MessageKind, UNEXPECTED_SERVER_ERROR};
use serde_json::json;
use tokio::sync::Mutex;

use crate::ui_ports::{ConfirmPrompt, ServerGateway, ServerRequest};

use super::{DELETE_ACTIONS_CONFIRMATION, ListPageService, MassDeleteRequest, PageOutcome};

struct FakeGateway {
    response: AppResult<String>,
    requests: Mutex<Vec<ServerRequest>>,
}

impl FakeGateway {
    fn answering(response: AppResult<String>) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ServerGateway for FakeGateway {
    async fn post_form(&self, request: ServerRequest) -> AppResult<String> {
        self.requests.lock().await.push(request);
        self.response.clone()
    }
}

struct FakeConfirmPrompt {
    answer: bool,
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl ConfirmPrompt for FakeConfirmPrompt {
    async fn confirm(&self, message: &str) -> AppResult<bool> {
        self.messages.lock().await.push(message.to_owned());
        Ok(self.answer)
    }
}

fn confirm(answer: bool) -> Arc<FakeConfirmPrompt> {
    Arc::new(FakeConfirmPrompt {
        answer,
        messages: Mutex::new(Vec::new()),
    })
}

fn delete_actions() -> MassDeleteRequest {
    MassDeleteRequest::Actions {
        eventsource: "0".to_owned(),
        actionids: vec!["3".to_owned(), "5".to_owned()],
    }
}

#[tokio::test]
async fn action_delete_posts_selected_ids_after_confirmation() {
    let gateway = Arc::new(FakeGateway::answering(Ok(json!({
        "success": {"title": "Actions deleted", "messages": []}
    })
    .to_string())));
    let prompt = confirm(true);
    let service = ListPageService::new(gateway.clone(), prompt.clone());

    let outcome = service
        .mass_delete(delete_actions())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        outcome,
        PageOutcome::Reload {
            message: Some(MessageBox::good(
                Some("Actions deleted".to_owned()),
                Vec::new()
            )),
        }
    );
    assert_eq!(
        prompt.messages.lock().await.as_slice(),
        [DELETE_ACTIONS_CONFIRMATION.to_owned()]
    );

    let requests = gateway.requests.lock().await;
    assert_eq!(requests[0].action, "action.delete");
    assert_eq!(
        requests[0].query,
        vec![("eventsource".to_owned(), "0".to_owned())]
    );
    let body: Vec<(&str, &str)> = requests[0]
        .body
        .iter()
        .map(|field| (field.name(), field.value()))
        .collect();
    assert_eq!(body, vec![("g_actionid[]", "3"), ("g_actionid[]", "5")]);
}

#[tokio::test]
async fn declined_confirmation_sends_nothing() {
    let gateway = Arc::new(FakeGateway::answering(Ok("{}".to_owned())));
    let service = ListPageService::new(gateway.clone(), confirm(false));

    let outcome = service
        .mass_delete(delete_actions())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(outcome, PageOutcome::Cancelled);
    assert!(gateway.requests.lock().await.is_empty());
}

#[tokio::test]
async fn action_delete_error_still_reloads_with_error_box() {
    let gateway = Arc::new(FakeGateway::answering(Ok(json!({
        "error": {"title": "Cannot delete actions", "messages": ["No permissions."]}
    })
    .to_string())));
    let service = ListPageService::new(gateway, confirm(true));

    let outcome = service
        .mass_delete(delete_actions())
        .await
        .unwrap_or_else(|_| unreachable!());

    let PageOutcome::Reload {
        message: Some(message),
    } = outcome
    else {
        unreachable!()
    };
    assert_eq!(message.kind(), MessageKind::Bad);
    assert_eq!(message.title(), Some("Cannot delete actions"));
    assert_eq!(message.messages(), ["No permissions.".to_owned()]);
}

#[tokio::test]
async fn unreadable_response_keeps_page_with_generic_error() {
    let gateway = Arc::new(FakeGateway::answering(Ok("<html>oops</html>".to_owned())));
    let service = ListPageService::new(gateway, confirm(true));

    let outcome = service
        .mass_delete(MassDeleteRequest::Hosts {
            hostids: vec!["10084".to_owned()],
        })
        .await
        .unwrap_or_else(|_| unreachable!());

    let PageOutcome::Stay { message } = outcome else {
        unreachable!()
    };
    assert_eq!(message.messages(), [UNEXPECTED_SERVER_ERROR.to_owned()]);
}

#[tokio::test]
async fn transport_failure_keeps_page_with_generic_error() {
    let gateway = Arc::new(FakeGateway::answering(Err(AppError::Transport(
        "connection refused".to_owned(),
    ))));
    let service = ListPageService::new(gateway, confirm(true));

    let outcome = service
        .mass_delete(delete_actions())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        outcome,
        PageOutcome::Stay {
            message: MessageBox::unexpected_server_error(),
        }
    );
}

#[tokio::test]
async fn host_delete_shows_rendered_errors_in_place() {
    let gateway = Arc::new(FakeGateway::answering(Ok(json!({
        "errors": "<output class=\"msg-bad\">Cannot delete host</output>"
    })
    .to_string())));
    let prompt = confirm(true);
    let service = ListPageService::new(gateway.clone(), prompt.clone());

    let outcome = service
        .mass_delete(MassDeleteRequest::Hosts {
            hostids: vec!["10084".to_owned()],
        })
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(matches!(outcome, PageOutcome::Stay { .. }));
    assert!(prompt.messages.lock().await.is_empty());
    let requests = gateway.requests.lock().await;
    assert_eq!(requests[0].action, "host.massdelete");
    assert_eq!(requests[0].body[0].name(), "hostids[]");
}

#[tokio::test]
async fn empty_selection_is_rejected() {
    let service = ListPageService::new(
        Arc::new(FakeGateway::answering(Ok("{}".to_owned()))),
        confirm(true),
    );

    let result = service
        .mass_delete(MassDeleteRequest::Hosts {
            hostids: Vec::new(),
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn submitted_dialogue_reloads_with_its_message() {
    let service = ListPageService::new(
        Arc::new(FakeGateway::answering(Ok("{}".to_owned()))),
        confirm(true),
    );

    let outcome = service
        .dialogue_submitted(&json!({"title": "Action updated", "messages": ["Saved."]}))
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        outcome,
        PageOutcome::Reload {
            message: Some(MessageBox::good(
                Some("Action updated".to_owned()),
                vec!["Saved.".to_owned()]
            )),
        }
    );
    assert_eq!(
        service.dialogue_deleted(&json!({"error": {"messages": []}})),
        PageOutcome::Reload { message: None }
    );
}
