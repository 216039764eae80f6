use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use repobird_tui::{
    domain::{Run, Task},
    services::{RunService, ServiceError},
};

/// Creates runs through the RepoBird HTTP API.
pub struct HttpRunService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRunService {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn runs_url(&self) -> String {
        format!("{}/api/v1/runs", self.base_url)
    }
}

#[async_trait]
impl RunService for HttpRunService {
    async fn create_run(&self, task: &Task, force: bool) -> Result<Run, ServiceError> {
        let mut payload = serde_json::to_value(task)
            .map_err(|err| ServiceError::io(format!("failed to encode task: {err}")))?;
        if let Some(object) = payload.as_object_mut() {
            object.insert("force".into(), Value::Bool(force));
        }

        let mut request = self.client.post(self.runs_url()).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|err| ServiceError::Network(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ServiceError::Network(err.to_string()))?;
        debug!(%status, bytes = body.len(), "create run response");

        if !status.is_success() {
            // Duplicate detection parses this text, so it is passed on as-is.
            let message = if body.trim().is_empty() {
                format!("request failed with status {status}")
            } else {
                body
            };
            return Err(ServiceError::remote(message));
        }
        parse_run(&body)
    }
}

/// Accepts `{"id": ..}` or `{"data": {"id": ..}}` with a string or numeric id.
fn parse_run(body: &str) -> Result<Run, ServiceError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| ServiceError::remote(format!("malformed server response: {err}")))?;
    let object = value.get("data").filter(|data| data.is_object()).unwrap_or(&value);
    let id = match object.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => String::new(),
    };
    let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
    Ok(Run {
        id,
        status: text("status"),
        title: text("title"),
    })
}
