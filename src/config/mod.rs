use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub payments: PaymentConfig,
    #[serde(default)]
    pub booking: BookingPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    /// Browser origin allowed by CORS. Unset means permissive.
    pub client_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// PEM encoded RS256 public key used to verify session tokens.
    pub jwt_public_key: Option<String>,
    /// HS256 shared secret, for local development only.
    pub jwt_secret: Option<String>,
    pub issuer: Option<String>,
    pub api_url: String,
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    #[serde(default)]
    pub enabled: bool,
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_url: String,
    pub currency: String,
    pub invoice_duration_secs: u32,
    pub success_redirect_url: String,
    pub failure_redirect_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingPolicy {
    pub tax_rate_percent: i64,
    pub cancellation_lead_days: i64,
    pub amount_tolerance_cents: i64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            secret_key: None,
            webhook_secret: None,
            api_url: "https://api.xendit.co".to_string(),
            currency: "PHP".to_string(),
            invoice_duration_secs: 86400,
            success_redirect_url: "http://localhost:5173/booking/success".to_string(),
            failure_redirect_url: "http://localhost:5173/booking/failed".to_string(),
        }
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            tax_rate_percent: 12,
            cancellation_lead_days: 7,
            amount_tolerance_cents: 100,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.base_url", "http://localhost:5000")?
            .set_default("database.url", "sqlite://skybridge.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.api_url", "https://api.clerk.com")?
            .set_default("payments.enabled", false)?
            .set_default("payments.api_url", "https://api.xendit.co")?
            .set_default("payments.currency", "PHP")?
            .set_default("payments.invoice_duration_secs", 86400)?
            .set_default("payments.success_redirect_url", "http://localhost:5173/booking/success")?
            .set_default("payments.failure_redirect_url", "http://localhost:5173/booking/failed")?
            .set_default("booking.tax_rate_percent", 12)?
            .set_default("booking.cancellation_lead_days", 7)?
            .set_default("booking.amount_tolerance_cents", 100)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with SKYBRIDGE__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("SKYBRIDGE").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                base_url: "http://localhost:5000".to_string(),
                client_url: Some("http://localhost:5173".to_string()),
            },
            database: DatabaseConfig {
                url: "sqlite://skybridge.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                jwt_public_key: None,
                jwt_secret: None,
                issuer: None,
                api_url: "https://api.clerk.com".to_string(),
                secret_key: None,
                webhook_secret: None,
            },
            payments: PaymentConfig::default(),
            booking: BookingPolicy::default(),
        }
    }
}
