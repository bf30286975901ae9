//! Telegram update relay.
//!
//! Long-polls the Telegram Bot API (`getUpdates`) and forwards every update,
//! byte for byte, to a local webhook. Lets an application that only
//! implements a webhook handler run without a public HTTPS endpoint.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//!
//! Optional:
//! - `PORT`: Port of the local application (default: 3000)
//! - `WEBHOOK_URL`: Full webhook URL (default: `http://localhost:$PORT/api/telegram/webhook`)
//! - `TELEGRAM_API_URL`: Bot API base URL (default: https://api.telegram.org)
//! - `RELAY_POLL_WAIT_SECS` / `RELAY_POLL_TIMEOUT_SECS` / `RELAY_BACKOFF_SECS`
//! - `RELAY_CURSOR_FILE`: Persist the cursor and resume from it on restart
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use relay_telegram::RelayArgs;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pump = relay_telegram::run(RelayArgs::parse(), async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     println!("stopped at cursor {}", pump.cursor());
//!     Ok(())
//! }
//! ```

pub mod relay;
pub mod settings;
pub mod source;
pub mod webhook;

pub use relay::run;
pub use settings::{validate_token, RelayArgs, RelaySettings};
pub use source::TelegramSource;
pub use webhook::WebhookSink;
