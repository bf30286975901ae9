//! Telegram Bot API `getUpdates` as an event source.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use relay_runtime::{Batch, ConfigError, Cursor, Event, EventSource, PollOutcome, SourceError};
use serde::Deserialize;
use serde_json::value::RawValue;
use tracing::trace;
use url::Url;

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Vec<Box<RawValue>>>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// The parts of an update the relay looks at.
#[derive(Debug, Deserialize)]
struct UpdateHeader {
    update_id: i64,
    #[serde(flatten)]
    fields: BTreeMap<String, serde::de::IgnoredAny>,
}

/// Long-polls `getUpdates` for one bot.
pub struct TelegramSource {
    client: reqwest::Client,
    /// Full `getUpdates` URL. Contains the token, never log it.
    endpoint: Url,
}

impl TelegramSource {
    /// Creates a source for the bot identified by `token`.
    pub fn new(client: reqwest::Client, api_url: &Url, token: &str) -> Result<Self, ConfigError> {
        // Tokens contain ':' so they cannot go through Url::join as a relative path.
        let base = api_url.as_str().trim_end_matches('/');
        let endpoint = Url::parse(&format!("{}/bot{}/getUpdates", base, token)).map_err(|e| {
            ConfigError::InvalidValue {
                key: "TELEGRAM_API_URL".to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self { client, endpoint })
    }

    /// Calls `getUpdates`. `Ok(None)` means the client timeout fired.
    async fn get_updates(
        &self,
        offset: Option<i64>,
        wait: Duration,
        timeout: Duration,
    ) -> Result<Option<Batch>, SourceError> {
        let mut request = self
            .client
            .get(self.endpoint.clone())
            .timeout(timeout)
            .query(&[("timeout", wait.as_secs())]);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Ok(None),
            Err(e) => return Err(transport_error(e)),
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => return Ok(None),
            Err(e) => return Err(transport_error(e)),
        };

        trace!(status = status.as_u16(), bytes = body.len(), "getUpdates answered");
        parse_response(status, &body).map(Some)
    }
}

#[async_trait]
impl EventSource for TelegramSource {
    async fn poll(
        &self,
        cursor: Cursor,
        wait: Duration,
        timeout: Duration,
    ) -> Result<PollOutcome, SourceError> {
        match self.get_updates(cursor.offset(), wait, timeout).await? {
            Some(batch) => Ok(PollOutcome::Batch(batch)),
            None => Ok(PollOutcome::TimedOut),
        }
    }

    async fn latest(&self, timeout: Duration) -> Result<Batch, SourceError> {
        // offset=-1 returns only the newest pending update.
        self.get_updates(Some(-1), Duration::ZERO, timeout)
            .await?
            .ok_or_else(|| SourceError::Transport("backlog fetch timed out".to_string()))
    }
}

/// reqwest puts the request URL, and with it the token, into error messages.
fn transport_error(e: reqwest::Error) -> SourceError {
    SourceError::Transport(e.without_url().to_string())
}

/// Turns a `getUpdates` body into a batch.
///
/// The Bot API reports failures as `ok: false` with a description, usually
/// on a 4xx status. A body that is not an API envelope is a decode error.
pub(crate) fn parse_response(
    status: reqwest::StatusCode,
    body: &[u8],
) -> Result<Batch, SourceError> {
    let envelope: ApiResponse = serde_json::from_slice(body).map_err(|e| {
        if status.is_success() {
            SourceError::Decode(e.to_string())
        } else {
            SourceError::Transport(format!("unexpected status {}", status))
        }
    })?;

    if !envelope.ok {
        return Err(SourceError::Api {
            description: envelope
                .description
                .unwrap_or_else(|| format!("request failed with status {}", status)),
            error_code: envelope.error_code,
        });
    }

    envelope
        .result
        .ok_or_else(|| SourceError::Decode("response has no result".to_string()))?
        .into_iter()
        .map(parse_update)
        .collect()
}

/// Extracts the id and kind of one update, keeping its raw JSON.
fn parse_update(raw: Box<RawValue>) -> Result<Event, SourceError> {
    let header: UpdateHeader = serde_json::from_str(raw.get())
        .map_err(|e| SourceError::Decode(format!("update without usable update_id: {}", e)))?;

    let event = Event::new(header.update_id, raw);
    Ok(match header.fields.into_keys().next() {
        Some(kind) => event.with_kind(kind),
        None => event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_parse_batch() {
        let body = br#"{"ok":true,"result":[
            {"update_id":101,"message":{"message_id":1,"text":"hi"}},
            {"update_id":102,"callback_query":{"id":"q1","data":"yes"}}
        ]}"#;

        let batch = parse_response(StatusCode::OK, body).unwrap();
        let events: Vec<_> = batch.into_iter().collect();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id(), 101);
        assert_eq!(events[0].kind(), Some("message"));
        assert_eq!(events[1].kind(), Some("callback_query"));
        assert_eq!(
            events[0].payload_str(),
            r#"{"update_id":101,"message":{"message_id":1,"text":"hi"}}"#
        );
    }

    #[test]
    fn test_parse_empty_result() {
        let batch = parse_response(StatusCode::OK, br#"{"ok":true,"result":[]}"#).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_parse_api_error() {
        let body = br#"{"ok":false,"error_code":409,"description":"Conflict: terminated by other getUpdates request"}"#;

        let err = parse_response(StatusCode::CONFLICT, body).unwrap_err();
        match err {
            SourceError::Api {
                description,
                error_code,
            } => {
                assert!(description.starts_with("Conflict"));
                assert_eq!(error_code, Some(409));
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_non_json_error_page() {
        let err = parse_response(StatusCode::BAD_GATEWAY, b"<html>502</html>").unwrap_err();
        assert!(matches!(err, SourceError::Transport(_)));
    }

    #[test]
    fn test_parse_garbage_success_body() {
        let err = parse_response(StatusCode::OK, b"{\"ok\":tru").unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[test]
    fn test_parse_update_without_id() {
        let body = br#"{"ok":true,"result":[{"message":{"text":"no id"}}]}"#;
        let err = parse_response(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[test]
    fn test_endpoint_contains_token_path() {
        let api = Url::parse("https://api.telegram.org/").unwrap();
        let source = TelegramSource::new(reqwest::Client::new(), &api, "123456:ABC-def").unwrap();
        assert_eq!(
            source.endpoint.as_str(),
            "https://api.telegram.org/bot123456:ABC-def/getUpdates"
        );
    }
}
