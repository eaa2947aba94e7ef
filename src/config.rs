use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::domain::validate;
use crate::error::AppError;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;
const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub default_subscription_fee: Decimal,
    pub max_body_bytes: usize,
    pub log: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./nest_funds.db".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            session_ttl_hours: 24,
            bcrypt_cost: 10,
            default_subscription_fee: Decimal::from(500),
            max_body_bytes: 64 * 1024,
            log: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the environment (after `.env` has been loaded). Unset variables
    /// fall back to the defaults; malformed ones are an error.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        let cfg = Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr)?,
            session_ttl_hours: parse_var("SESSION_TTL_HOURS", defaults.session_ttl_hours)?,
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            default_subscription_fee: parse_var(
                "DEFAULT_SUBSCRIPTION_FEE",
                defaults.default_subscription_fee,
            )?,
            max_body_bytes: parse_var("MAX_BODY_BYTES", defaults.max_body_bytes)?,
            log: env::var("LOG").unwrap_or(defaults.log),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
            return Err(AppError::Config(format!(
                "SESSION_TTL_HOURS must be between 1 and {}",
                MAX_SESSION_TTL_HOURS
            )));
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(AppError::Config(format!(
                "BCRYPT_COST must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }
        if self.default_subscription_fee <= Decimal::ZERO
            || self.default_subscription_fee > validate::max_amount()
        {
            return Err(AppError::Config(
                "DEFAULT_SUBSCRIPTION_FEE must be positive and not too large".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{name}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_cost() {
        let cfg = AppConfig { bcrypt_cost: 99, ..AppConfig::default() };
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn session_ttl_is_bounded() {
        for hours in [0, MAX_SESSION_TTL_HOURS + 1, i64::MAX] {
            let cfg = AppConfig { session_ttl_hours: hours, ..AppConfig::default() };
            assert!(matches!(cfg.validate(), Err(AppError::Config(_))), "{hours}");
        }
        let cfg = AppConfig { session_ttl_hours: MAX_SESSION_TTL_HOURS, ..AppConfig::default() };
        cfg.validate().unwrap();
    }
}
