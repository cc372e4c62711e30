/// Client configuration
///
/// Loaded from environment variables (a `.env` file is honoured in
/// development) into a typed struct.
///
/// # Environment Variables
///
/// - `TASKHUB_API_URL`: base URL of the TaskHub service (required)
/// - `TASKHUB_TIMEOUT_SECS`: per-request timeout (default: 30)
/// - `TASKHUB_AUTH_TOKEN`: bearer token sent with every request (optional)
/// - `TASKHUB_MIN_WITHDRAWAL_COINS`: withdrawal threshold (default: 200)
/// - `TASKHUB_COINS_PER_DOLLAR`: withdrawal rate (default: 20)
/// - `TASKHUB_CURRENCY`: payment currency (default: usd)
/// - `TASKHUB_LOG_FORMAT`: `pretty` or `json` (default: pretty)
///
/// # Example
///
/// ```no_run
/// use taskhub_client::config::ClientConfig;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = ClientConfig::from_env()?;
/// println!("Talking to {}", config.api.base_url);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use taskhub_shared::ledger::{COINS_PER_DOLLAR, MIN_WITHDRAWAL_COINS};
use taskhub_shared::Coins;

/// Complete client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Remote service settings
    pub api: ApiConfig,

    /// Ledger parameters
    pub ledger: LedgerConfig,

    /// Log output settings
    pub logging: LoggingConfig,
}

/// Remote service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, without trailing slash
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Optional bearer token
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
}

/// Ledger parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub min_withdrawal: Coins,
    pub coins_per_dollar: u32,
    pub currency: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_withdrawal: MIN_WITHDRAWAL_COINS,
            coins_per_dollar: COINS_PER_DOLLAR,
            currency: "usd".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Log output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl ApiConfig {
    /// Local development defaults
    pub fn local() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
            auth_token: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Joins `path` onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl ClientConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `TASKHUB_API_URL` is missing
    /// - A numeric variable does not parse
    /// - `TASKHUB_COINS_PER_DOLLAR` is zero
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let base_url = env::var("TASKHUB_API_URL")
            .map_err(|_| anyhow::anyhow!("TASKHUB_API_URL environment variable is required"))?;

        let timeout_secs = env::var("TASKHUB_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()?;

        let auth_token = env::var("TASKHUB_AUTH_TOKEN").ok().filter(|t| !t.is_empty());

        let min_withdrawal = match env::var("TASKHUB_MIN_WITHDRAWAL_COINS") {
            Ok(raw) => raw
                .parse::<Coins>()
                .map_err(|e| anyhow::anyhow!("TASKHUB_MIN_WITHDRAWAL_COINS: {}", e))?,
            Err(_) => MIN_WITHDRAWAL_COINS,
        };

        let coins_per_dollar = env::var("TASKHUB_COINS_PER_DOLLAR")
            .unwrap_or_else(|_| COINS_PER_DOLLAR.to_string())
            .parse::<u32>()?;
        if coins_per_dollar == 0 {
            anyhow::bail!("TASKHUB_COINS_PER_DOLLAR must be greater than zero");
        }

        let currency = env::var("TASKHUB_CURRENCY").unwrap_or_else(|_| "usd".to_string());

        let format = match env::var("TASKHUB_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            api: ApiConfig {
                base_url,
                timeout_secs,
                auth_token,
            },
            ledger: LedgerConfig {
                min_withdrawal,
                coins_per_dollar,
                currency,
            },
            logging: LoggingConfig { format },
        })
    }

    /// Configuration pointing at `base_url` with defaults elsewhere
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: base_url.into(),
                ..ApiConfig::local()
            },
            ledger: LedgerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
