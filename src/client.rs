use crate::config::Config;
use crate::conversation::{HistoryEntry, Turn};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Duration;
use tracing::{debug, warn};

/// Prefix of the reply shown when the service reports an error
pub const SERVICE_ERROR_PREFIX: &str = "Sorry, there was an error: ";

/// Reply shown when the service could not be reached or answered garbage
pub const UNREACHABLE_MESSAGE: &str =
    "I'm having trouble connecting right now. Please try again in a moment!";

/// Body posted to the chat route
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub query: &'a str,
    pub history: &'a [HistoryEntry],
}

impl<'a> From<&'a Turn> for ChatRequest<'a> {
    fn from(turn: &'a Turn) -> Self {
        Self {
            query: &turn.query,
            history: &turn.history,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("malformed response: {0}")]
    Malformed(&'static str),
}

/// The three ways a chat request can end
#[derive(Debug)]
pub enum ReplyOutcome {
    /// Well-formed response with a null `error`
    Payload(String),
    /// Well-formed response carrying an `error` string
    ServiceError(String),
    /// Network failure, timeout or malformed body
    TransportFailure(TransportError),
}

impl ReplyOutcome {
    /// Text of the assistant message this outcome is displayed as
    pub fn into_content(self) -> String {
        match self {
            ReplyOutcome::Payload(payload) => payload,
            ReplyOutcome::ServiceError(error) => format!("{SERVICE_ERROR_PREFIX}{error}"),
            ReplyOutcome::TransportFailure(_) => UNREACHABLE_MESSAGE.to_string(),
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        matches!(self, ReplyOutcome::TransportFailure(_))
    }
}

/// Interpret a chat response body.
///
/// The body must be a JSON object with an `error` key. A null `error` needs a
/// string `payload`; anything else is malformed.
pub fn parse_reply(body: &str) -> Result<ReplyOutcome, TransportError> {
    let value: Value = serde_json::from_str(body)?;
    let object = value
        .as_object()
        .ok_or(TransportError::Malformed("response is not a JSON object"))?;

    match object.get("error") {
        None => Err(TransportError::Malformed("missing `error` field")),
        Some(Value::String(error)) => Ok(ReplyOutcome::ServiceError(error.clone())),
        Some(Value::Null) => match object.get("payload") {
            Some(Value::String(payload)) => Ok(ReplyOutcome::Payload(payload.clone())),
            _ => Err(TransportError::Malformed("`payload` is not a string")),
        },
        Some(_) => Err(TransportError::Malformed("`error` is neither a string nor null")),
    }
}

/// Anything that can answer a turn. Implementations absorb every failure into
/// the returned outcome and never retry.
#[async_trait]
pub trait RecommendationService: Send + Sync {
    async fn recommend(&self, turn: &Turn) -> ReplyOutcome;
}

/// HTTP client for the recommendation service
#[derive(Clone)]
pub struct RecommendationClient {
    chat_url: String,
    health_url: String,
    client: reqwest::Client,
}

impl RecommendationClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            chat_url: config.chat_url(),
            health_url: config.health_url(),
            client,
        })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// Issue one chat request and map whatever happens into an outcome
    pub async fn send(&self, turn: &Turn) -> ReplyOutcome {
        match self.exchange(turn).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(url = %self.chat_url, error = %e, "recommendation service unreachable");
                ReplyOutcome::TransportFailure(e)
            }
        }
    }

    /// The status code is not consulted: the service answers 400 and 500 with
    /// a regular `{payload, error}` body.
    async fn exchange(&self, turn: &Turn) -> Result<ReplyOutcome, TransportError> {
        debug!(
            url = %self.chat_url,
            history_len = turn.history.len(),
            "sending chat request"
        );

        let response = self
            .client
            .post(&self.chat_url)
            .json(&ChatRequest::from(turn))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "chat response received");

        parse_reply(&body)
    }

    /// Probe the service's liveness route
    pub async fn ping(&self) -> Result<reqwest::StatusCode, TransportError> {
        let response = self.client.get(&self.health_url).send().await?;
        Ok(response.status())
    }
}

#[async_trait]
impl RecommendationService for RecommendationClient {
    async fn recommend(&self, turn: &Turn) -> ReplyOutcome {
        self.send(turn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Author;
    use axum::{Json, Router, http::StatusCode, routing::{get, post}};
    use std::sync::{Arc, Mutex};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(endpoint: String) -> RecommendationClient {
        let mut config = Config::default();
        config.endpoint = endpoint;
        config.request_timeout_secs = 5;
        RecommendationClient::new(&config).unwrap()
    }

    fn turn(query: &str) -> Turn {
        Turn {
            query: query.to_string(),
            history: vec![
                HistoryEntry { role: Author::User, content: "q1".to_string() },
                HistoryEntry { role: Author::Assistant, content: "a1".to_string() },
            ],
        }
    }

    #[test]
    fn payload_reply_is_shown_verbatim() {
        let outcome = parse_reply(r#"{"error": null, "payload": "Try 'Dune'."}"#).unwrap();
        assert_eq!(outcome.into_content(), "Try 'Dune'.");
    }

    #[test]
    fn service_error_uses_template() {
        let outcome = parse_reply(r#"{"error": "model unavailable", "payload": null}"#).unwrap();
        assert_eq!(outcome.into_content(), "Sorry, there was an error: model unavailable");
    }

    #[test]
    fn service_error_wins_over_payload() {
        let outcome = parse_reply(r#"{"error": "boom", "payload": "ignored"}"#).unwrap();
        assert!(matches!(outcome, ReplyOutcome::ServiceError(ref e) if e == "boom"));
    }

    #[test]
    fn malformed_bodies_are_transport_failures() {
        for body in [
            "not json",
            "[1, 2]",
            r#"{"payload": "no error key"}"#,
            r#"{"error": null}"#,
            r#"{"error": null, "payload": 42}"#,
            r#"{"error": 500, "payload": null}"#,
        ] {
            assert!(parse_reply(body).is_err(), "expected {body:?} to be rejected");
        }
    }

    #[test]
    fn transport_failure_maps_to_fallback() {
        let outcome = ReplyOutcome::TransportFailure(TransportError::Malformed("x"));
        assert!(outcome.is_transport_failure());
        assert_eq!(outcome.into_content(), UNREACHABLE_MESSAGE);
    }

    #[test]
    fn request_body_matches_wire_shape() {
        let turn = turn("something cozy");
        let json = serde_json::to_value(ChatRequest::from(&turn)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "query": "something cozy",
                "history": [
                    {"role": "user", "content": "q1"},
                    {"role": "assistant", "content": "a1"},
                ],
            })
        );
    }

    #[tokio::test]
    async fn posts_query_and_history_to_chat_route() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let router = Router::new().route(
            "/chat",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some(body);
                    Json(serde_json::json!({"payload": "Try 'Dune'.", "error": null}))
                }
            }),
        );
        let client = client_for(serve(router).await);

        let outcome = client.send(&turn("desert politics")).await;
        assert_eq!(outcome.into_content(), "Try 'Dune'.");

        let body = seen.lock().unwrap().take().unwrap();
        assert_eq!(body["query"], "desert politics");
        assert_eq!(body["history"].as_array().unwrap().len(), 2);
        assert_eq!(body["history"][1]["role"], "assistant");
    }

    #[tokio::test]
    async fn error_status_with_regular_body_is_service_error() {
        let router = Router::new().route(
            "/chat",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"payload": null, "error": "model unavailable"})),
                )
            }),
        );
        let client = client_for(serve(router).await);

        let outcome = client.send(&turn("anything")).await;
        assert_eq!(outcome.into_content(), "Sorry, there was an error: model unavailable");
    }

    #[tokio::test]
    async fn html_error_page_is_transport_failure() {
        let router = Router::new().route(
            "/chat",
            post(|| async { (StatusCode::BAD_GATEWAY, "<h1>Bad Gateway</h1>") }),
        );
        let client = client_for(serve(router).await);

        let outcome = client.send(&turn("anything")).await;
        assert!(outcome.is_transport_failure());
    }

    #[tokio::test]
    async fn slow_service_times_out_as_transport_failure() {
        let router = Router::new().route(
            "/chat",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(serde_json::json!({"payload": "too late", "error": null}))
            }),
        );
        let mut config = Config::default();
        config.endpoint = serve(router).await;
        config.request_timeout_secs = 1;
        let client = RecommendationClient::new(&config).unwrap();

        let outcome = client.send(&turn("anything")).await;
        assert!(outcome.is_transport_failure());
        assert_eq!(outcome.into_content(), UNREACHABLE_MESSAGE);
    }

    #[tokio::test]
    async fn connection_refused_is_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(format!("http://{addr}"));

        let outcome = client.send(&turn("anything")).await;
        assert!(outcome.is_transport_failure());
        assert_eq!(outcome.into_content(), UNREACHABLE_MESSAGE);
    }

    #[tokio::test]
    async fn ping_reports_status_of_health_route() {
        let router = Router::new().route("/hello_world", get(|| async { "<h1>Hello, World!</h1>" }));
        let client = client_for(serve(router).await);

        assert!(client.ping().await.unwrap().is_success());
    }
}
