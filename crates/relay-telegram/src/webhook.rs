//! Local webhook as the relay sink.

use async_trait::async_trait;
use relay_runtime::{Event, EventSink, SinkError};
use reqwest::header::CONTENT_TYPE;
use tracing::trace;
use url::Url;

/// POSTs each update, unmodified, to the application's webhook.
pub struct WebhookSink {
    client: reqwest::Client,
    url: Url,
}

impl WebhookSink {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    fn destination(&self) -> &str {
        self.url.as_str()
    }

    async fn deliver(&self, event: &Event) -> Result<(), SinkError> {
        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(event.payload_str().to_owned())
            .send()
            .await
            .map_err(|e| SinkError::Transport {
                destination: self.destination().to_string(),
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        trace!(event_id = event.id(), status = status.as_u16(), "webhook answered");

        if status.is_success() {
            Ok(())
        } else {
            Err(SinkError::Status {
                destination: self.destination().to_string(),
                status: status.as_u16(),
            })
        }
    }
}
