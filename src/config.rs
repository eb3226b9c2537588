use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sheets,
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sheets" | "google" | "google_sheets" => Ok(Self::Sheets),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub store_backend: StoreBackend,
    pub spreadsheet_id: Option<String>,
    pub google_sheets_access_token: Option<String>,
    pub sheets_api_base: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub require_auth: bool,
    pub token_ttl_hours: i64,
    pub api_rps: u32,
    pub resend_api_key: Option<String>,
    pub resend_api_base: String,
    pub email_from_name: String,
    pub default_email_alias: Option<String>,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_phone_number: Option<String>,
    pub twilio_api_base: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let config = Self {
            server_address: get_env("SERVER_ADDRESS")?,
            store_backend: get_env_parse_or("STORE_BACKEND", StoreBackend::Sheets)?,
            spreadsheet_id: get_env_opt("SPREADSHEET_ID"),
            google_sheets_access_token: get_env_opt("GOOGLE_SHEETS_ACCESS_TOKEN"),
            sheets_api_base: get_env_opt("SHEETS_API_BASE")
                .unwrap_or_else(|| "https://sheets.googleapis.com/v4".to_string()),
            database_url: get_env_opt("DATABASE_URL"),
            jwt_secret: get_env("JWT_SECRET")?,
            require_auth: get_env_parse_or("REQUIRE_AUTH", false)?,
            token_ttl_hours: get_env_parse_or("TOKEN_TTL_HOURS", 12)?,
            api_rps: get_env_parse_or("API_RPS", 50)?,
            resend_api_key: get_env_opt("RESEND_API_KEY"),
            resend_api_base: get_env_opt("RESEND_API_BASE")
                .unwrap_or_else(|| "https://api.resend.com".to_string()),
            email_from_name: get_env_opt("EMAIL_FROM_NAME")
                .unwrap_or_else(|| "Processo Seletivo".to_string()),
            default_email_alias: get_env_opt("DEFAULT_EMAIL_ALIAS"),
            twilio_account_sid: get_env_opt("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: get_env_opt("TWILIO_AUTH_TOKEN"),
            twilio_phone_number: get_env_opt("TWILIO_PHONE_NUMBER"),
            twilio_api_base: get_env_opt("TWILIO_API_BASE")
                .unwrap_or_else(|| "https://api.twilio.com/2010-04-01".to_string()),
        };
        config.check_backend()?;
        Ok(config)
    }

    /// Settings used by tests and local runs: in-memory store, no providers.
    pub fn for_memory(jwt_secret: &str) -> Self {
        Self {
            server_address: "127.0.0.1:0".to_string(),
            store_backend: StoreBackend::Memory,
            spreadsheet_id: None,
            google_sheets_access_token: None,
            sheets_api_base: "https://sheets.googleapis.com/v4".to_string(),
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            require_auth: false,
            token_ttl_hours: 12,
            api_rps: 100,
            resend_api_key: None,
            resend_api_base: "https://api.resend.com".to_string(),
            email_from_name: "Processo Seletivo".to_string(),
            default_email_alias: None,
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_phone_number: None,
            twilio_api_base: "https://api.twilio.com/2010-04-01".to_string(),
        }
    }

    fn check_backend(&self) -> Result<()> {
        match self.store_backend {
            StoreBackend::Sheets => {
                if self.spreadsheet_id.is_none() {
                    return Err(Error::Config(
                        "SPREADSHEET_ID is required for the sheets backend".to_string(),
                    ));
                }
                if self.google_sheets_access_token.is_none() {
                    return Err(Error::Config(
                        "GOOGLE_SHEETS_ACCESS_TOKEN is required for the sheets backend".to_string(),
                    ));
                }
            }
            StoreBackend::Postgres => {
                if self.database_url.is_none() {
                    return Err(Error::Config(
                        "DATABASE_URL is required for the postgres backend".to_string(),
                    ));
                }
            }
            StoreBackend::Memory => {}
        }
        Ok(())
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_names() {
        assert_eq!("sheets".parse::<StoreBackend>().unwrap(), StoreBackend::Sheets);
        assert_eq!("PostgreSQL".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!(" memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("excel".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn sheets_backend_needs_spreadsheet_id() {
        let mut config = Config::for_memory("secret");
        config.store_backend = StoreBackend::Sheets;
        assert!(matches!(config.check_backend(), Err(Error::Config(_))));

        config.spreadsheet_id = Some("sheet-id".into());
        config.google_sheets_access_token = Some("token".into());
        assert!(config.check_backend().is_ok());
    }
}
