//! Input checks shared by the HTTP API and the console. Each returns the
//! normalized value or a `Validation` error carrying the message shown to
//! the user.

use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Largest amount accepted for a single donation, fee or payout.
pub fn max_amount() -> Decimal {
    Decimal::from(10_000_000_000_000i64)
}

pub const TOO_LARGE: &str = "Amount is too large";

pub fn required(value: &str, msg: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(msg));
    }
    Ok(trimmed.to_string())
}

/// Blank optional text is stored as NULL.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn positive(amount: Decimal, msg: &str) -> AppResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation(msg));
    }
    if amount > max_amount() {
        return Err(AppError::validation(TOO_LARGE));
    }
    Ok(amount)
}

pub fn email(value: &str) -> AppResult<String> {
    let email = value.trim().to_ascii_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::validation("Invalid email address"));
    }
    Ok(email)
}

pub fn password(value: &str) -> AppResult<&str> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(value)
}

/// Payment proofs are links to an uploaded receipt. Blank means none.
pub fn proof_url(value: Option<String>) -> AppResult<Option<String>> {
    let Some(url) = optional(value) else {
        return Ok(None);
    };
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !url.chars().any(char::is_whitespace) => Ok(Some(url)),
        _ => Err(AppError::validation("Payment proof must be a valid URL")),
    }
}

pub fn month(month: u32) -> AppResult<u32> {
    if !(1..=12).contains(&month) {
        return Err(AppError::validation("Month must be between 1 and 12"));
    }
    Ok(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_and_checked() {
        assert_eq!(email("  Ali@Example.COM ").unwrap(), "ali@example.com");
        for bad in ["", "ali", "ali@", "@example.com", "ali@example", "a b@example.com", "ali@.com"] {
            assert!(email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(password("12345").is_err());
        assert_eq!(password("123456").unwrap(), "123456");
    }

    #[test]
    fn proof_url_accepts_blank_and_http_links() {
        assert_eq!(proof_url(None).unwrap(), None);
        assert_eq!(proof_url(Some("  ".into())).unwrap(), None);
        assert_eq!(
            proof_url(Some("https://files.example.org/r/1.png".into())).unwrap(),
            Some("https://files.example.org/r/1.png".to_string())
        );
        assert!(proof_url(Some("ftp://x".into())).is_err());
        assert!(proof_url(Some("https://".into())).is_err());
    }

    #[test]
    fn amounts_must_be_positive() {
        assert!(positive(Decimal::ZERO, "Amount must be positive").is_err());
        assert!(positive(Decimal::NEGATIVE_ONE, "Amount must be positive").is_err());
        assert_eq!(positive(Decimal::TEN, "x").unwrap(), Decimal::TEN);
    }

    #[test]
    fn amounts_are_capped() {
        assert_eq!(positive(max_amount(), "x").unwrap(), max_amount());
        let err = positive(Decimal::MAX, "x").unwrap_err();
        assert_eq!(err.public_message(), TOO_LARGE);
    }

    #[test]
    fn months_are_one_based() {
        assert!(month(0).is_err());
        assert!(month(13).is_err());
        assert_eq!(month(12).unwrap(), 12);
    }
}
