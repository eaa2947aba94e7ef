use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kind of fund a donation goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    MasjidFund,
    DeathCommittee,
    Charity,
    Other,
}

impl Default for ServiceType {
    fn default() -> Self {
        ServiceType::Other
    }
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::MasjidFund,
        ServiceType::DeathCommittee,
        ServiceType::Charity,
        ServiceType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MasjidFund => "MASJID_FUND",
            Self::DeathCommittee => "DEATH_COMMITTEE",
            Self::Charity => "CHARITY",
            Self::Other => "OTHER",
        }
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown service type '{s}'"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub target_amount: Option<Decimal>,
    pub current_amount: Decimal,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub transaction_count: i64,
}

impl Service {
    /// Share of the target reached, in percent. `None` without a target.
    pub fn progress_percent(&self) -> Option<Decimal> {
        let target = self.target_amount.filter(|t| !t.is_zero())?;
        Some((self.current_amount * Decimal::ONE_HUNDRED / target).round_dp(1))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub service_type: ServiceType,
    pub target_amount: Option<Decimal>,
}

/// Partial update; absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub service_type: Option<ServiceType>,
    pub target_amount: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn service(current: &str, target: Option<&str>) -> Service {
        Service {
            id: 1,
            name: "Roof repair".into(),
            description: None,
            service_type: ServiceType::MasjidFund,
            target_amount: target.map(|t| Decimal::from_str(t).unwrap()),
            current_amount: Decimal::from_str(current).unwrap(),
            is_active: true,
            created_at: chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            transaction_count: 0,
        }
    }

    #[test]
    fn progress_is_relative_to_target() {
        assert_eq!(
            service("250", Some("1000")).progress_percent(),
            Some(Decimal::from_str("25.0").unwrap())
        );
        assert_eq!(service("250", None).progress_percent(), None);
        assert_eq!(service("250", Some("0")).progress_percent(), None);
    }

    #[test]
    fn service_type_round_trips_through_text() {
        for t in ServiceType::ALL {
            assert_eq!(ServiceType::from_str(t.as_str()).unwrap(), t);
        }
        assert_eq!("charity".parse::<ServiceType>().unwrap(), ServiceType::Charity);
    }
}
