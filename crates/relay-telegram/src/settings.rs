//! Process settings: command line flags backed by environment variables.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use relay_persistence::CursorFile;
use relay_runtime::{ConfigError, Pump, PumpConfig, StartupPolicy};
use url::Url;

use crate::source::TelegramSource;
use crate::webhook::WebhookSink;

/// Environment variable holding the bot credential.
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Default Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Path of the webhook on the local application.
pub const WEBHOOK_PATH: &str = "/api/telegram/webhook";

/// Values shipped in `.env.example` files that are not real tokens.
const PLACEHOLDER_TOKENS: &[&str] = &[
    "your_bot_token_here",
    "your-telegram-bot-token",
    "your_telegram_bot_token",
    "changeme",
];

/// Telegram update relay - forwards Bot API updates to a local webhook
#[derive(Parser, Clone)]
#[command(name = "telegram-relay")]
#[command(about = "Long-polls the Telegram Bot API and forwards every update to a local webhook")]
pub struct RelayArgs {
    /// Bot token from @BotFather. Read from `TELEGRAM_BOT_TOKEN` only, so it
    /// never shows up in the process arguments.
    #[arg(skip = std::env::var(TOKEN_ENV).ok())]
    pub bot_token: Option<String>,

    /// Port of the local application receiving updates
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Full webhook URL (default: http://localhost:<port>/api/telegram/webhook)
    #[arg(long, env = "WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Seconds the Bot API may hold a poll open
    #[arg(long, env = "RELAY_POLL_WAIT_SECS", default_value_t = 30)]
    pub poll_wait: u64,

    /// Client-side poll timeout in seconds, must exceed --poll-wait
    #[arg(long, env = "RELAY_POLL_TIMEOUT_SECS", default_value_t = 35)]
    pub poll_timeout: u64,

    /// Seconds to pause after a failed poll
    #[arg(long, env = "RELAY_BACKOFF_SECS", default_value_t = 5)]
    pub backoff: u64,

    /// Persist the cursor to this file and resume from it on restart
    #[arg(long, env = "RELAY_CURSOR_FILE")]
    pub cursor_file: Option<PathBuf>,

    /// Forward updates that queued up while the relay was down instead of skipping them
    #[arg(long)]
    pub replay_backlog: bool,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl fmt::Debug for RelayArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayArgs")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("port", &self.port)
            .field("webhook_url", &self.webhook_url)
            .field("api_url", &self.api_url)
            .field("poll_wait", &self.poll_wait)
            .field("poll_timeout", &self.poll_timeout)
            .field("backoff", &self.backoff)
            .field("cursor_file", &self.cursor_file)
            .field("replay_backlog", &self.replay_backlog)
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// Validated settings. Building these never touches the network.
#[derive(Clone)]
pub struct RelaySettings {
    bot_token: String,
    pub api_url: Url,
    pub webhook_url: Url,
    pub pump: PumpConfig,
    pub cursor_file: Option<PathBuf>,
}

impl fmt::Debug for RelaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelaySettings")
            .field("bot_token", &"<redacted>")
            .field("api_url", &self.api_url.as_str())
            .field("webhook_url", &self.webhook_url.as_str())
            .field("pump", &self.pump)
            .field("cursor_file", &self.cursor_file)
            .finish()
    }
}

impl RelaySettings {
    /// Validates parsed arguments.
    ///
    /// A missing or placeholder token is rejected here, before any client is
    /// built.
    pub fn from_args(args: RelayArgs) -> Result<Self, ConfigError> {
        let bot_token = validate_token(args.bot_token.as_deref())?;

        let api_url = parse_url("TELEGRAM_API_URL", &args.api_url)?;
        let webhook_url = match args.webhook_url.as_deref() {
            Some(url) => parse_url("WEBHOOK_URL", url)?,
            None => default_webhook_url(args.port)?,
        };

        let startup = if args.replay_backlog {
            StartupPolicy::Replay
        } else {
            StartupPolicy::DrainBacklog
        };
        let pump = PumpConfig::new()
            .with_poll_wait(Duration::from_secs(args.poll_wait))
            .with_poll_timeout(Duration::from_secs(args.poll_timeout))
            .with_backoff(Duration::from_secs(args.backoff))
            .with_startup(startup);
        pump.validate()?;

        Ok(Self {
            bot_token,
            api_url,
            webhook_url,
            pump,
            cursor_file: args.cursor_file,
        })
    }

    /// Builds the pump wired to the Bot API and the webhook.
    pub fn build_pump(&self) -> Result<Pump<TelegramSource, WebhookSink>, ConfigError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("telegram-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "http client".to_string(),
                reason: e.to_string(),
            })?;

        let source = TelegramSource::new(client.clone(), &self.api_url, &self.bot_token)?;
        let sink = WebhookSink::new(client, self.webhook_url.clone());

        let pump = Pump::new(source, sink, self.pump.clone());
        Ok(match &self.cursor_file {
            Some(path) => pump.with_cursor_store(CursorFile::new(path)),
            None => pump,
        })
    }
}

/// Rejects missing, blank and template tokens.
pub fn validate_token(token: Option<&str>) -> Result<String, ConfigError> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ConfigError::MissingCredential(TOKEN_ENV.to_string()))?;

    if PLACEHOLDER_TOKENS
        .iter()
        .any(|placeholder| token.eq_ignore_ascii_case(placeholder))
    {
        return Err(ConfigError::PlaceholderCredential(TOKEN_ENV.to_string()));
    }

    Ok(token.to_string())
}

fn default_webhook_url(port: u16) -> Result<Url, ConfigError> {
    parse_url("PORT", &format!("http://localhost:{}{}", port, WEBHOOK_PATH))
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: format!("{}: {}", value, e),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_runtime::EventSink;

    fn args(token: Option<&str>) -> RelayArgs {
        RelayArgs {
            bot_token: token.map(String::from),
            port: 3000,
            webhook_url: None,
            api_url: DEFAULT_API_URL.to_string(),
            poll_wait: 30,
            poll_timeout: 35,
            backoff: 5,
            cursor_file: None,
            replay_backlog: false,
            verbose: 0,
        }
    }

    #[test]
    fn test_missing_token_rejected() {
        let result = RelaySettings::from_args(args(None));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::MissingCredential(TOKEN_ENV.to_string())
        );
    }

    #[test]
    fn test_blank_token_rejected() {
        assert!(matches!(
            validate_token(Some("   ")),
            Err(ConfigError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_placeholder_token_rejected() {
        for placeholder in ["your_bot_token_here", "YOUR_BOT_TOKEN_HERE", "changeme"] {
            assert!(matches!(
                validate_token(Some(placeholder)),
                Err(ConfigError::PlaceholderCredential(_))
            ));
        }
    }

    #[test]
    fn test_token_is_trimmed() {
        assert_eq!(
            validate_token(Some(" 123456:ABC-def \n")).unwrap(),
            "123456:ABC-def"
        );
    }

    #[test]
    fn test_default_webhook_follows_port() {
        let mut a = args(Some("123456:ABC"));
        a.port = 8080;

        let settings = RelaySettings::from_args(a).unwrap();
        assert_eq!(
            settings.webhook_url.as_str(),
            "http://localhost:8080/api/telegram/webhook"
        );
    }

    #[test]
    fn test_explicit_webhook_url_wins() {
        let mut a = args(Some("123456:ABC"));
        a.webhook_url = Some("http://app.internal:9000/hooks/tg".to_string());

        let settings = RelaySettings::from_args(a).unwrap();
        assert_eq!(settings.webhook_url.as_str(), "http://app.internal:9000/hooks/tg");
    }

    #[test]
    fn test_bad_webhook_url_rejected() {
        let mut a = args(Some("123456:ABC"));
        a.webhook_url = Some("not a url".to_string());
        assert!(matches!(
            RelaySettings::from_args(a),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut a = args(Some("123456:ABC"));
        a.webhook_url = Some("ftp://example.com/hook".to_string());
        assert!(matches!(
            RelaySettings::from_args(a),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_timeout_must_exceed_wait() {
        let mut a = args(Some("123456:ABC"));
        a.poll_timeout = 30;
        assert!(matches!(
            RelaySettings::from_args(a),
            Err(ConfigError::TimeoutNotAboveWait { .. })
        ));
    }

    #[test]
    fn test_replay_flag_sets_policy() {
        let mut a = args(Some("123456:ABC"));
        a.replay_backlog = true;

        let settings = RelaySettings::from_args(a).unwrap();
        assert_eq!(settings.pump.startup, StartupPolicy::Replay);
    }

    #[test]
    fn test_debug_redacts_token() {
        let settings = RelaySettings::from_args(args(Some("123456:SECRET"))).unwrap();
        assert!(!format!("{:?}", settings).contains("SECRET"));
        assert!(!format!("{:?}", args(Some("123456:SECRET"))).contains("SECRET"));
    }

    #[test]
    fn test_parse_flags() {
        let mut parsed = RelayArgs::try_parse_from([
            "telegram-relay",
            "--port",
            "4000",
            "--api-url",
            "http://127.0.0.1:8081",
            "--poll-wait",
            "10",
            "--poll-timeout",
            "15",
            "--backoff",
            "2",
            "--replay-backlog",
            "-vv",
        ])
        .unwrap();

        assert_eq!(parsed.port, 4000);
        assert_eq!(parsed.verbose, 2);
        assert!(parsed.replay_backlog);

        parsed.bot_token = Some("123456:ABC".to_string());
        let settings = RelaySettings::from_args(parsed).unwrap();
        assert_eq!(settings.pump.poll_wait, Duration::from_secs(10));
        assert_eq!(settings.pump.poll_timeout, Duration::from_secs(15));
        assert_eq!(settings.pump.backoff, Duration::from_secs(2));
        assert_eq!(settings.api_url.as_str(), "http://127.0.0.1:8081/");
    }

    #[test]
    fn test_token_is_not_a_flag() {
        let result = RelayArgs::try_parse_from(["telegram-relay", "--bot-token", "123456:ABC"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_pump_with_cursor_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(Some("123456:ABC"));
        a.cursor_file = Some(dir.path().join("cursor.json"));

        let settings = RelaySettings::from_args(a).unwrap();
        let pump = settings.build_pump().unwrap();

        assert!(!pump.cursor().is_set());
        assert_eq!(
            pump.sink().destination(),
            "http://localhost:3000/api/telegram/webhook"
        );
    }
}
