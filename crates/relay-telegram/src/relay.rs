//! Validated startup plus the relay loop, as one fallible unit.

use std::future::Future;

use relay_runtime::{Pump, RelayError, Runtime};
use tracing::info;

use crate::settings::{RelayArgs, RelaySettings};
use crate::source::TelegramSource;
use crate::webhook::WebhookSink;

/// Validates `args`, then relays until `signal` resolves.
///
/// Configuration problems surface as [`RelayError::Config`] before any
/// request is made. The caller decides the exit status from
/// [`RelayError::severity`].
pub async fn run<F>(args: RelayArgs, signal: F) -> Result<Pump<TelegramSource, WebhookSink>, RelayError>
where
    F: Future<Output = ()>,
{
    let settings = RelaySettings::from_args(args)?;
    let pump = settings.build_pump()?;

    info!(
        webhook = %settings.webhook_url,
        poll_wait_secs = settings.pump.poll_wait.as_secs(),
        startup = ?settings.pump.startup,
        cursor_file = ?settings.cursor_file,
        "relaying Telegram updates"
    );

    Runtime::new(pump).run_until(signal).await
}
