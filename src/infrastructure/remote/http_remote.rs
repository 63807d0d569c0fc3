use crate::application::ports::{RemoteError, RemoteStore};
use crate::domain::value_objects::{EntityKind, RecordId, RecordPatch, RecordPayload};
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 256;

/// JSON/REST client for the remote record service.
///
/// Routes: `POST /{store}`, `PATCH /{store}/{id}`, `DELETE /{store}/{id}`,
/// `GET /{store}` and `GET /health`.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(
        base_url: &str,
        api_token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = api_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                AppError::ConfigurationError("remote api token is not a valid header".to_string())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::ConfigurationError(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `None` when no remote url is configured.
    pub fn from_config(config: &RemoteConfig) -> Result<Option<Self>, AppError> {
        match config.base_url.as_deref() {
            Some(url) => Self::new(
                url,
                config.api_token.as_deref(),
                Duration::from_secs(config.timeout_secs),
            )
            .map(Some),
            None => Ok(None),
        }
    }

    fn collection_url(&self, kind: EntityKind) -> String {
        format!("{}/{}", self.base_url, kind.as_str())
    }

    fn record_url(&self, kind: EntityKind, id: &RecordId) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            kind.as_str(),
            urlencoding::encode(id.as_str())
        )
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, RemoteError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body.chars().take(MAX_ERROR_BODY_CHARS).collect()
        };
        tracing::debug!(
            target: "sync::remote",
            status = status.as_u16(),
            %message,
            "remote error response"
        );
        Err(RemoteError::from_status(status.as_u16(), message))
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_decode() {
        RemoteError::InvalidResponse(err.to_string())
    } else {
        RemoteError::Unreachable(err.to_string())
    }
}

/// Accepts either a bare JSON array or `{ "data": [...] }`.
fn records_from_body(body: Value) -> Result<Vec<RecordPayload>, RemoteError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(RemoteError::InvalidResponse(
                    "expected a JSON array of records".to_string(),
                ))
            }
        },
        _ => {
            return Err(RemoteError::InvalidResponse(
                "expected a JSON array of records".to_string(),
            ))
        }
    };

    items
        .into_iter()
        .map(|item| RecordPayload::new(item).map_err(RemoteError::InvalidResponse))
        .collect()
}

/// The record a successful create stored. The create was applied once the
/// server answered 2xx, so a body without a usable record (empty, `{}`, 204 or
/// not JSON) keeps the record as sent.
fn created_record(kind: EntityKind, sent: &RecordPayload, body: &[u8]) -> RecordPayload {
    if body.iter().all(u8::is_ascii_whitespace) {
        return sent.clone();
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => {
            let stored = RecordPayload::new(Value::Object(map))
                .and_then(|payload| payload.record_id().map(|_| payload));
            match stored {
                Ok(stored) => stored,
                Err(err) => {
                    tracing::warn!(
                        target: "sync::remote",
                        store = %kind,
                        error = %err,
                        "create response has no usable record; keeping sent record"
                    );
                    sent.clone()
                }
            }
        }
        Ok(_) => sent.clone(),
        Err(err) => {
            tracing::warn!(
                target: "sync::remote",
                store = %kind,
                error = %err,
                "create response is not JSON; keeping sent record"
            );
            sent.clone()
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn create(
        &self,
        kind: EntityKind,
        record: &RecordPayload,
    ) -> Result<RecordPayload, RemoteError> {
        let response = self
            .send(self.client.post(self.collection_url(kind)).json(record))
            .await?;
        let body = response.bytes().await.map_err(transport_error)?;
        Ok(created_record(kind, record, &body))
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<(), RemoteError> {
        self.send(self.client.patch(self.record_url(kind, id)).json(patch))
            .await?;
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &RecordId) -> Result<(), RemoteError> {
        self.send(self.client.delete(self.record_url(kind, id)))
            .await?;
        Ok(())
    }

    async fn fetch_all(&self, kind: EntityKind) -> Result<Vec<RecordPayload>, RemoteError> {
        let response = self
            .send(self.client.get(self.collection_url(kind)))
            .await?;
        let body: Value = response.json().await.map_err(transport_error)?;
        records_from_body(body)
    }

    async fn health_check(&self) -> Result<(), RemoteError> {
        self.send(self.client.get(format!("{}/health", self.base_url)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and hands back the raw request.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    fn client(base_url: &str) -> HttpRemoteStore {
        HttpRemoteStore::new(base_url, Some("secret"), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn record_url_encodes_id() {
        let remote = client("http://localhost:9000/api/");
        let id = RecordId::new("a b/c".to_string()).unwrap();
        assert_eq!(
            remote.record_url(EntityKind::Tasks, &id),
            "http://localhost:9000/api/tasks/a%20b%2Fc"
        );
        assert_eq!(
            remote.collection_url(EntityKind::Income),
            "http://localhost:9000/api/income"
        );
    }

    #[test]
    fn records_from_body_accepts_wrapped_arrays() {
        let bare = records_from_body(json!([{ "id": "1" }])).unwrap();
        let wrapped = records_from_body(json!({ "data": [{ "id": "1" }] })).unwrap();
        assert_eq!(bare, wrapped);
        assert!(records_from_body(json!({ "items": [] })).is_err());
        assert!(records_from_body(json!([1, 2])).is_err());
    }

    #[tokio::test]
    async fn create_posts_record_with_bearer_token() {
        let (url, server) =
            serve_once("201 Created", r#"{"id":"srv-7","name":"North","area":1.0}"#).await;
        let record = RecordPayload::new(json!({ "id": "temp_1_abc", "name": "North", "area": 1.0 }))
            .unwrap();

        let stored = client(&url).create(EntityKind::Fields, &record).await.unwrap();
        assert_eq!(stored.record_id().unwrap().as_str(), "srv-7");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /fields HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
    }

    #[tokio::test]
    async fn create_with_empty_success_body_keeps_sent_record() {
        let record = RecordPayload::new(json!({ "id": "temp_1_abc", "name": "North" })).unwrap();

        for status_line in ["201 Created", "204 No Content"] {
            let (url, _server) = serve_once(status_line, "").await;
            let stored = client(&url).create(EntityKind::Fields, &record).await;
            assert_eq!(stored, Ok(record.clone()), "{status_line}");
        }
    }

    #[test]
    fn created_record_falls_back_to_sent_record() {
        let sent = RecordPayload::new(json!({ "id": "temp_1_abc" })).unwrap();
        let kind = EntityKind::Fields;

        assert_eq!(created_record(kind, &sent, b"  \n"), sent);
        assert_eq!(created_record(kind, &sent, b"{}"), sent);
        assert_eq!(created_record(kind, &sent, b"created"), sent);
        assert_eq!(created_record(kind, &sent, br#"{"name":"no id"}"#), sent);
        let stored = created_record(kind, &sent, br#"{"id":"srv-9"}"#);
        assert_eq!(stored.record_id().unwrap().as_str(), "srv-9");
    }

    #[tokio::test]
    async fn conflict_maps_to_already_exists() {
        let (url, _server) = serve_once("409 Conflict", r#"{"error":"duplicate"}"#).await;
        let record = RecordPayload::new(json!({ "id": "f1" })).unwrap();

        let err = client(&url)
            .create(EntityKind::Fields, &record)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn validation_failure_maps_to_rejected() {
        let (url, _server) =
            serve_once("422 Unprocessable Entity", r#"{"error":"bad area"}"#).await;
        let id = RecordId::new("f1".to_string()).unwrap();

        let err = client(&url)
            .update(EntityKind::Fields, &id, &RecordPatch::new().set("area", -1))
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::rejected(422, r#"{"error":"bad area"}"#));
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"))
            .health_check()
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
