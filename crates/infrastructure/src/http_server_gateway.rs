use std::time::Duration;

use async_trait::async_trait;
use authconsole_application::{ServerGateway, ServerRequest};
use authconsole_core::{AppError, AppResult};
use authconsole_domain::FormField;
use tracing::{debug, warn};
use url::Url;
use url::form_urlencoded;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// HTTP implementation of the server gateway.
///
/// Every request is a form POST to the configured entry point with the
/// server action in the `action` query parameter.
pub struct HttpServerGateway {
    http_client: reqwest::Client,
    endpoint: Url,
    max_attempts: u8,
    retry_backoff_ms: u64,
}

impl HttpServerGateway {
    /// Creates a gateway posting to `endpoint`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        endpoint: Url,
        max_attempts: u8,
        retry_backoff_ms: u64,
    ) -> Self {
        Self {
            http_client,
            endpoint,
            max_attempts: max_attempts.max(1),
            retry_backoff_ms: retry_backoff_ms.max(50),
        }
    }

    fn request_url(&self, request: &ServerRequest) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("action", request.action.as_str());
            for (name, value) in &request.query {
                pairs.append_pair(name, value);
            }
        }

        url
    }
}

fn encode_body(fields: &[FormField]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for field in fields {
        serializer.append_pair(field.name(), field.value());
    }

    serializer.finish()
}

#[async_trait]
impl ServerGateway for HttpServerGateway {
    async fn post_form(&self, request: ServerRequest) -> AppResult<String> {
        let url = self.request_url(&request);
        let body = encode_body(&request.body);

        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < self.max_attempts {
            attempt = attempt.saturating_add(1);
            let response = self
                .http_client
                .post(url.clone())
                .header(reqwest::header::CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(body.clone())
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => {
                    debug!(
                        action = request.action.as_str(),
                        attempt, "server action answered"
                    );
                    return response.text().await.map_err(|error| {
                        AppError::Transport(format!(
                            "failed to read response of '{}': {error}",
                            request.action
                        ))
                    });
                }
                Ok(response)
                    if response.status().is_server_error()
                        || response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS =>
                {
                    last_error = Some(format!(
                        "transient HTTP status {} for '{}'",
                        response.status(),
                        request.action
                    ));
                }
                Ok(response) => {
                    return Err(AppError::Transport(format!(
                        "server action '{}' failed with status {}",
                        request.action,
                        response.status()
                    )));
                }
                Err(error) => {
                    last_error = Some(format!(
                        "server action '{}' transport error: {error}",
                        request.action
                    ));
                }
            }

            if attempt < self.max_attempts {
                warn!(
                    action = request.action.as_str(),
                    attempt, "retrying server action"
                );
                let delay = self.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Transport(last_error.unwrap_or_else(|| {
            format!("server action '{}' exhausted retries", request.action)
        })))
    }
}
