use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::enums::{AccountStatus, ParseEnumError};

/// Classification of a student by what is still owed on the current account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStatus {
    /// Nothing left to pay (balance <= 0).
    Paid,
    /// Something was paid but a balance remains.
    Partial,
    /// Nothing was paid and a balance remains.
    Unpaid,
}

impl BalanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceStatus::Paid => "paid",
            BalanceStatus::Partial => "partial",
            BalanceStatus::Unpaid => "unpaid",
        }
    }

    /// Ledger status persisted for this classification.
    pub fn account_status(&self) -> AccountStatus {
        match self {
            BalanceStatus::Paid => AccountStatus::Paid,
            BalanceStatus::Partial => AccountStatus::Partial,
            BalanceStatus::Unpaid => AccountStatus::Pending,
        }
    }
}

impl fmt::Display for BalanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BalanceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(BalanceStatus::Paid),
            "partial" => Ok(BalanceStatus::Partial),
            "unpaid" => Ok(BalanceStatus::Unpaid),
            other => Err(ParseEnumError {
                kind: "balance status",
                value: other.to_string(),
            }),
        }
    }
}

/// Full breakdown of a ledger row's balance, as returned by the balance endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BalanceBreakdown {
    #[schema(value_type = String)]
    pub tuition_fee: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    #[schema(value_type = String)]
    pub paid_amount: Decimal,
    #[schema(value_type = String)]
    pub forwarded: Decimal,
    /// Scholarship percentage applied to the tuition fee
    #[schema(value_type = String)]
    pub scholarship_percent: Decimal,
    #[schema(value_type = String)]
    pub scholarship_amount: Decimal,
    #[schema(value_type = String)]
    pub balance: Decimal,
    pub status: BalanceStatus,
}
