use std::time::Duration;

use async_std::task;
use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;
use crate::iracing::{ DriverSnapshot, PollResult };

pub const DRIVER_PATH: &str = "/api/driver";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can produce one driver snapshot per call.
#[async_trait]
pub trait DriverSource: Send + Sync + 'static {
    async fn fetch(&self) -> PollResult;

    /// Where the data comes from, for log lines.
    fn describe(&self) -> String;
}

#[derive(Clone)]
pub struct HttpDriverSource {
    url: String,
    agent: ureq::Agent,
}

impl HttpDriverSource {
    pub fn new(host: &str, port: u16) -> HttpDriverSource {
        HttpDriverSource::with_timeout(host, port, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(host: &str, port: u16, timeout: Duration) -> HttpDriverSource {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .build();

        HttpDriverSource {
            url: format!("http://{}:{}{}", host, port, DRIVER_PATH),
            agent,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn fetch_blocking(&self) -> PollResult {
        let request = self.agent.get(&self.url)
            .set("Accept", "application/json")
            .set("Content-Type", "application/json");

        match request.call() {
            Ok(response) => {
                let status = response.status();
                let status_text = response.status_text().to_string();
                let body = response.into_string()
                    .map_err(|err| FetchError::Decode { url: self.url.clone(), reason: err.to_string() })?;
                interpret_response(&self.url, status, &status_text, &body)
            },
            Err(ureq::Error::Status(status, response)) => {
                let status_text = response.status_text().to_string();
                let body = response.into_string().unwrap_or_default();
                interpret_response(&self.url, status, &status_text, &body)
            },
            Err(ureq::Error::Transport(transport)) => {
                debug!("Transport failure for {}: {}", self.url, transport);
                Err(FetchError::Connection { url: self.url.clone(), reason: transport.to_string() })
            },
        }
    }
}

#[async_trait]
impl DriverSource for HttpDriverSource {
    async fn fetch(&self) -> PollResult {
        let source = self.clone();
        task::spawn_blocking(move || source.fetch_blocking()).await
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Fetches driver data once from `http://{host}:{port}/api/driver`.
pub async fn fetch_driver_data(host: &str, port: u16) -> PollResult {
    HttpDriverSource::new(host, port).fetch().await
}

/// Turns a received HTTP response into a snapshot or a typed failure.
pub fn interpret_response(url: &str, status: u16, status_text: &str, body: &str) -> PollResult {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<Value>(body).ok()
            .and_then(|parsed| error_message(&parsed))
            .unwrap_or_else(|| reason_phrase(status, status_text));
        return Err(FetchError::Http { status, message });
    }

    let parsed: Value = serde_json::from_str(body)
        .map_err(|err| FetchError::Decode { url: url.to_string(), reason: err.to_string() })?;

    if let Some(message) = error_message(&parsed) {
        return Err(FetchError::Application { message });
    }

    serde_json::from_value::<DriverSnapshot>(parsed)
        .map_err(|err| FetchError::Decode { url: url.to_string(), reason: err.to_string() })
}

// An `error` field counts when it carries something: empty strings, false and
// null are ignored.
fn error_message(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.is_empty() => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

fn reason_phrase(status: u16, status_text: &str) -> String {
    if !status_text.trim().is_empty() {
        return status_text.trim().to_string();
    }

    let canonical = match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown error",
    };
    canonical.to_string()
}
