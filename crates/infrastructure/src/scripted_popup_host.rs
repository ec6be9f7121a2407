//! Popup host answering editors from a prepared script. Used by the console
//! front end, where no interactive dialogue exists.

use std::collections::VecDeque;

use async_trait::async_trait;
use authconsole_application::{PopupHost, PopupRequest};
use authconsole_core::{AppError, AppResult};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;

/// Popup host returning queued editor payloads in order.
///
/// A `None` entry closes the editor without submitting.
pub struct ScriptedPopupHost {
    responses: Mutex<VecDeque<Option<Value>>>,
}

impl ScriptedPopupHost {
    /// Creates a host answering with `responses`.
    #[must_use]
    pub fn new(responses: impl IntoIterator<Item = Option<Value>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }

    /// Returns how many answers are left.
    pub async fn remaining(&self) -> usize {
        self.responses.lock().await.len()
    }
}

#[async_trait]
impl PopupHost for ScriptedPopupHost {
    async fn open(&self, request: PopupRequest) -> AppResult<Option<Value>> {
        let response = self.responses.lock().await.pop_front().ok_or_else(|| {
            AppError::Internal(format!("no scripted answer left for editor '{}'", request.kind))
        })?;

        let params = Value::Object(request.params);
        info!(
            editor = %request.kind,
            action = request.kind.action(),
            params = %params,
            submitted = response.is_some(),
            "scripted editor closed"
        );

        Ok(response)
    }
}
