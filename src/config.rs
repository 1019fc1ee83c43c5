//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;
use std::path::PathBuf;

use crate::models::submission::FormVariant;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): PostgreSQL connection string. Without it the
///   server keeps submissions in memory and loses them on restart.
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `UPLOAD_DIR` (optional): root directory for uploaded documents, defaults to `./uploads`
/// - `SESSION_SECRET` (optional): HMAC key for session tokens. A random key is
///   generated per process when missing, so sessions do not survive restarts.
/// - `APP_ENV` (optional): `production` turns on the `Secure` cookie attribute
/// - `BCRYPT_COST` (optional): bcrypt work factor, defaults to 12
/// - `FORM_VARIANT` (optional): `stock` or `policy`, defaults to `stock`
/// - `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `NOTIFY_RECIPIENTS`: email alerts
/// - `NOTIFY_WEBHOOK_URL`, `NOTIFY_WEBHOOK_SECRET`: signed webhook alerts
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    #[serde(default)]
    pub session_secret: Option<String>,

    #[serde(default = "default_app_env")]
    pub app_env: String,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default)]
    pub form_variant: FormVariant,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    /// Comma-separated list of addresses that receive submission alerts.
    #[serde(default)]
    pub notify_recipients: Vec<String>,

    #[serde(default)]
    pub notify_webhook_url: Option<String>,

    #[serde(default)]
    pub notify_webhook_secret: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_bcrypt_cost() -> u32 {
    12
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            server_port: default_port(),
            upload_dir: default_upload_dir(),
            session_secret: None,
            app_env: default_app_env(),
            bcrypt_cost: default_bcrypt_cost(),
            form_variant: FormVariant::default(),
            smtp_host: default_smtp_host(),
            smtp_username: None,
            smtp_password: None,
            notify_recipients: Vec::new(),
            notify_webhook_url: None,
            notify_webhook_secret: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variable values cannot be parsed into
    /// expected types (e.g. a non-numeric `SERVER_PORT` or an unknown `FORM_VARIANT`).
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: upload_dir -> UPLOAD_DIR
        envy::from_env::<Config>()
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}
