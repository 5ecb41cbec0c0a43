//! Environment-backed application configuration.

use std::env;
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth_secret: String,
    pub nats_url: Option<String>,
    /// Staging directory for invoice artifacts before they are streamed back.
    pub invoice_dir: PathBuf,
    pub invoice_font: Option<PathBuf>,
    pub invoice_logo: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let require = |name: &str| {
            env::var(name)
                .map_err(|_| AppError::Config(format!("missing environment variable `{name}`")))
        };

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8083".to_string())
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("invalid PORT: {e}")))?;
        let database_url = require("DATABASE_URL")?;
        let auth_secret = require("AUTH_SECRET")?;
        let nats_url = env::var("NATS_URL").ok();
        let invoice_dir = env::var("INVOICE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./invoices"));
        let invoice_font = env::var("INVOICE_FONT").ok().map(PathBuf::from);
        let invoice_logo = env::var("INVOICE_LOGO").ok().map(PathBuf::from);

        Ok(Self {
            host,
            port,
            database_url,
            auth_secret,
            nats_url,
            invoice_dir,
            invoice_font,
            invoice_logo,
        })
    }
}
