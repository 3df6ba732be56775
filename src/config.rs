//! Configuration management for the auth core
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! Secrets are validated once at load time so a misconfigured deployment
//! fails at startup, not on the first request.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub otp: OtpSettings,
    pub sms: SmsSettings,
}

impl Settings {
    /// Load settings from environment variables (and .env in development)
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        let jwt = JwtSettings::from_env()?;
        jwt.validate()?;

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            jwt,
            otp: OtpSettings::from_env()?,
            sms: SmsSettings::from_env(),
        })
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// JWT signing settings. Access and refresh tokens are signed with separate
/// HS256 secrets so a leaked access secret cannot mint refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    /// Access-token lifetime in seconds (default: 15 minutes)
    pub access_expiry_secs: i64,
    /// Refresh-token lifetime in seconds (default: 7 days)
    pub refresh_expiry_secs: i64,
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            access_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            refresh_secret: env::var("JWT_REFRESH_SECRET")
                .context("JWT_REFRESH_SECRET must be set")?,
            access_expiry_secs: env::var("JWT_EXPIRES_IN_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .context("Invalid JWT_EXPIRES_IN_SECS")?,
            refresh_expiry_secs: env::var("JWT_REFRESH_EXPIRES_IN_SECS")
                .unwrap_or_else(|_| "604800".to_string())
                .parse()
                .context("Invalid JWT_REFRESH_EXPIRES_IN_SECS")?,
        })
    }

    /// Fail fast on secrets that would silently weaken token security
    pub fn validate(&self) -> Result<()> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            bail!("JWT secrets must not be empty");
        }
        if self.access_secret == self.refresh_secret {
            bail!("JWT_SECRET and JWT_REFRESH_SECRET must differ");
        }
        if self.access_expiry_secs <= 0 || self.refresh_expiry_secs <= 0 {
            bail!("JWT expiries must be positive");
        }
        Ok(())
    }
}

/// OTP challenge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpSettings {
    /// Process-wide salt mixed into OTP digests
    pub salt: String,
    /// Challenge lifetime in seconds (default: 10 minutes)
    pub expiry_secs: i64,
    /// Minimum gap between sends for one (phone, purpose) key (default: 60s)
    pub rate_limit_secs: i64,
    /// Wrong-code budget per challenge (default: 3)
    pub max_attempts: i32,
}

impl OtpSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            salt: env::var("OTP_SALT").context("OTP_SALT must be set")?,
            expiry_secs: env::var("OTP_EXPIRY_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .context("Invalid OTP_EXPIRY_SECS")?,
            rate_limit_secs: env::var("OTP_RATE_LIMIT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid OTP_RATE_LIMIT_SECS")?,
            max_attempts: env::var("OTP_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("Invalid OTP_MAX_ATTEMPTS")?,
        })
    }
}

/// SMS delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsSettings {
    /// "sns" for AWS SNS delivery, anything else logs the message instead
    pub provider: String,
    /// Optional alphanumeric sender id shown on the handset
    pub sender_id: Option<String>,
}

impl SmsSettings {
    fn from_env() -> Self {
        Self {
            provider: env::var("SMS_PROVIDER").unwrap_or_else(|_| "log".to_string()),
            sender_id: env::var("SMS_SENDER_ID").ok(),
        }
    }

    pub fn is_sns(&self) -> bool {
        self.provider.eq_ignore_ascii_case("sns")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_jwt_settings_from_env() {
        env::set_var("JWT_SECRET", "access-secret");
        env::set_var("JWT_REFRESH_SECRET", "refresh-secret");
        env::set_var("JWT_EXPIRES_IN_SECS", "900");

        let settings = JwtSettings::from_env().unwrap();

        assert_eq!(settings.access_secret, "access-secret");
        assert_eq!(settings.refresh_secret, "refresh-secret");
        assert_eq!(settings.access_expiry_secs, 900);
        assert_eq!(settings.refresh_expiry_secs, 604800); // Default
        assert!(settings.validate().is_ok());

        env::remove_var("JWT_SECRET");
        env::remove_var("JWT_REFRESH_SECRET");
        env::remove_var("JWT_EXPIRES_IN_SECS");
    }

    #[test]
    #[serial]
    fn test_shared_jwt_secret_is_rejected() {
        let settings = JwtSettings {
            access_secret: "same".to_string(),
            refresh_secret: "same".to_string(),
            access_expiry_secs: 900,
            refresh_expiry_secs: 604800,
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_otp_settings_defaults() {
        env::set_var("OTP_SALT", "test-salt");
        env::remove_var("OTP_EXPIRY_SECS");
        env::remove_var("OTP_RATE_LIMIT_SECS");
        env::remove_var("OTP_MAX_ATTEMPTS");

        let settings = OtpSettings::from_env().unwrap();

        assert_eq!(settings.salt, "test-salt");
        assert_eq!(settings.expiry_secs, 600);
        assert_eq!(settings.rate_limit_secs, 60);
        assert_eq!(settings.max_attempts, 3);

        env::remove_var("OTP_SALT");
    }

    #[test]
    #[serial]
    fn test_database_settings_from_env() {
        env::set_var("DATABASE_URL", "postgres://localhost/auth");
        env::set_var("DATABASE_MAX_CONNECTIONS", "50");

        let settings = DatabaseSettings::from_env().unwrap();

        assert_eq!(settings.url, "postgres://localhost/auth");
        assert_eq!(settings.max_connections, 50);
        assert_eq!(settings.min_connections, 2); // Default

        env::remove_var("DATABASE_URL");
        env::remove_var("DATABASE_MAX_CONNECTIONS");
    }
}
