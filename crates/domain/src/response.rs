use authconsole_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message shown after an unreadable or failed server exchange.
pub const UNEXPECTED_SERVER_ERROR: &str = "Unexpected server error.";

/// Visual tone of a message box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Success box.
    Good,
    /// Error box.
    Bad,
}

/// Dismissible message box rendered near the acting form or dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBox {
    kind: MessageKind,
    title: Option<String>,
    messages: Vec<String>,
}

impl MessageBox {
    /// Creates a success message box.
    #[must_use]
    pub fn good(title: Option<String>, messages: Vec<String>) -> Self {
        Self {
            kind: MessageKind::Good,
            title,
            messages,
        }
    }

    /// Creates an error message box.
    #[must_use]
    pub fn bad(title: Option<String>, messages: Vec<String>) -> Self {
        Self {
            kind: MessageKind::Bad,
            title,
            messages,
        }
    }

    /// Creates the generic transport failure box.
    #[must_use]
    pub fn unexpected_server_error() -> Self {
        Self::bad(None, vec![UNEXPECTED_SERVER_ERROR.to_owned()])
    }

    /// Returns the tone.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns the title, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the detail messages.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

/// Response envelope returned by console controllers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerResponse {
    /// `{error: {title?, messages}}`: permission or business rule failure.
    Error {
        /// Optional headline.
        title: Option<String>,
        /// Detail messages.
        messages: Vec<String>,
    },
    /// `{success: {title, messages?}}`.
    Success {
        /// Headline.
        title: String,
        /// Detail messages.
        messages: Vec<String>,
    },
    /// `{errors: <html>}`: pre-rendered validation message markup.
    RenderedErrors {
        /// Server-rendered markup.
        html: String,
    },
    /// `{title, messages?}`: completed dialogue action.
    Completed {
        /// Headline.
        title: String,
        /// Detail messages.
        messages: Vec<String>,
    },
}

impl ServerResponse {
    /// Parses a response body.
    ///
    /// Non-JSON bodies and unknown shapes are transport errors.
    pub fn parse(body: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|error| AppError::Transport(format!("response is not JSON: {error}")))?;

        Self::from_value(&value)
    }

    /// Interprets an already decoded response value.
    pub fn from_value(value: &Value) -> AppResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            AppError::Transport("response must be a JSON object".to_owned())
        })?;

        if let Some(error) = object.get("error") {
            return Ok(Self::Error {
                title: optional_text(error.get("title")),
                messages: text_list(error.get("messages")),
            });
        }

        if let Some(success) = object.get("success") {
            return Ok(Self::Success {
                title: optional_text(success.get("title")).unwrap_or_default(),
                messages: text_list(success.get("messages")),
            });
        }

        if let Some(errors) = object.get("errors") {
            return Ok(Self::RenderedErrors {
                html: optional_text(Some(errors)).unwrap_or_default(),
            });
        }

        if let Some(title) = optional_text(object.get("title")) {
            return Ok(Self::Completed {
                title,
                messages: text_list(object.get("messages")),
            });
        }

        Err(AppError::Transport(
            "response has no recognised envelope".to_owned(),
        ))
    }

    /// Returns whether the server reported a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::RenderedErrors { .. })
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| optional_text(Some(item)))
            .collect(),
        Some(Value::Object(items)) => items
            .values()
            .filter_map(|item| optional_text(Some(item)))
            .collect(),
        Some(other) => optional_text(Some(other)).into_iter().collect(),
        None => Vec::new(),
    }
}
