use async_trait::async_trait;
use authconsole_core::AppResult;
use authconsole_domain::FormField;

/// Form POST addressed to a server action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRequest {
    /// Server action name, sent as the `action` query parameter.
    pub action: String,
    /// Additional query parameters.
    pub query: Vec<(String, String)>,
    /// URL-encoded body fields, in order.
    pub body: Vec<FormField>,
}

impl ServerRequest {
    /// Creates a request for one server action.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            query: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Adds body fields.
    #[must_use]
    pub fn with_body(mut self, fields: impl IntoIterator<Item = FormField>) -> Self {
        self.body.extend(fields);
        self
    }
}

/// Port for posting forms to the server.
#[async_trait]
pub trait ServerGateway: Send + Sync {
    /// Posts one form and returns the raw response body.
    ///
    /// Network failures and non-success statuses map to `AppError::Transport`.
    async fn post_form(&self, request: ServerRequest) -> AppResult<String>;
}
