//! Client for the remote responder service

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path of the one endpoint the responder exposes.
pub const CHAT_PATH: &str = "/chat";

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("request to responder failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("responder returned status {status}")]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("responder reported an error: {0}")]
    Reported(String),

    #[error("malformed responder body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("responder task did not complete: {0}")]
    Interrupted(String),
}

/// Anything that can answer a chat message with a reply string.
///
/// The reply is returned raw; formatting happens in the controller.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String, ResponderError>;
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Body of a `/chat` response: either a reply or the service's error detail.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChatReply {
    Success { response: String },
    Failure { detail: serde_json::Value },
}

impl ChatReply {
    pub fn into_result(self) -> Result<String, ResponderError> {
        match self {
            ChatReply::Success { response } => Ok(response),
            ChatReply::Failure { detail } => Err(ResponderError::Reported(detail_text(&detail))),
        }
    }
}

fn detail_text(detail: &serde_json::Value) -> String {
    match detail {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Clone)]
pub struct HttpResponder {
    client: Client,
    base_url: String,
}

impl HttpResponder {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, CHAT_PATH)
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn reply(&self, message: &str) -> Result<String, ResponderError> {
        let url = self.endpoint();
        tracing::debug!(%url, chars = message.chars().count(), "sending message to responder");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ChatReply>(&body)
                .ok()
                .and_then(|reply| match reply {
                    ChatReply::Failure { detail } => Some(detail_text(&detail)),
                    ChatReply::Success { .. } => None,
                });
            return Err(ResponderError::Status { status, detail });
        }

        let reply: ChatReply = serde_json::from_slice(&body)?;
        reply.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_string(&ChatRequest { message: "hi" }).unwrap();
        assert_eq!(body, r#"{"message":"hi"}"#);
    }

    #[test]
    fn test_reply_decodes_success_and_failure() {
        let ok: ChatReply = serde_json::from_str(r#"{"response":"hey"}"#).unwrap();
        assert_eq!(ok.into_result().unwrap(), "hey");

        let err: ChatReply = serde_json::from_str(r#"{"detail":"Empty request"}"#).unwrap();
        assert!(matches!(err.into_result(), Err(ResponderError::Reported(d)) if d == "Empty request"));
    }

    #[test]
    fn test_reply_rejects_unknown_shape() {
        assert!(serde_json::from_str::<ChatReply>(r#"{"answer":"x"}"#).is_err());
    }

    #[test]
    fn test_endpoint_joins_path() {
        assert_eq!(HttpResponder::new("http://localhost:8008/").endpoint(), "http://localhost:8008/chat");
    }

    #[tokio::test]
    async fn test_http_reply_round_trip() {
        let router = Router::new().route(
            "/chat",
            post(|Json(body): Json<Value>| async move {
                let message = body["message"].as_str().unwrap_or_default().to_string();
                Json(json!({ "response": format!("echo: {}", message) }))
            }),
        );
        let base = serve(router).await;

        let reply = HttpResponder::new(&base).reply("Привет").await.unwrap();
        assert_eq!(reply, "echo: Привет");
    }

    #[tokio::test]
    async fn test_http_error_status_is_failure() {
        let router = Router::new().route(
            "/chat",
            post(|| async {
                (
                    AxumStatus::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error: Please try again later" })),
                )
            }),
        );
        let base = serve(router).await;

        let err = HttpResponder::new(&base).reply("hi").await.unwrap_err();
        match err {
            ResponderError::Status { status, detail } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(detail.as_deref(), Some("Internal server error: Please try again later"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_http_malformed_body_is_failure() {
        let router = Router::new().route("/chat", post(|| async { "definitely not json" }));
        let base = serve(router).await;

        let err = HttpResponder::new(&base).reply("hi").await.unwrap_err();
        assert!(matches!(err, ResponderError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_responder_is_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = HttpResponder::new(&format!("http://{}", addr)).reply("hi").await.unwrap_err();
        assert!(matches!(err, ResponderError::Transport(_)));
    }
}
