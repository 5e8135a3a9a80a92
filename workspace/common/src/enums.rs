use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Returned when a wire string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` from one table of wire names,
/// keeping them in step with the serde renames.
macro_rules! wire_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// Role claim carried in the JWT and stored on the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Registrar,
    Accountant,
    Viewer,
}

wire_enum!(Role, "role", {
    Admin => "admin",
    Registrar => "registrar",
    Accountant => "accountant",
    Viewer => "viewer",
});

/// Payment state of one semester ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Pending,
    Partial,
    Paid,
}

wire_enum!(AccountStatus, "account status", {
    Pending => "pending",
    Partial => "partial",
    Paid => "paid",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Tuition,
    Admission,
    Exam,
    Other,
}

wire_enum!(PaymentType, "payment type", {
    Tuition => "tuition",
    Admission => "admission",
    Exam => "exam",
    Other => "other",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    MobileBanking,
}

wire_enum!(PaymentMethod, "payment method", {
    Cash => "cash",
    Card => "card",
    BankTransfer => "bankTransfer",
    MobileBanking => "mobileBanking",
});

/// Lifecycle of an admission application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

wire_enum!(ApplicationStatus, "application status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

/// Kind of academic calendar event. `SemesterEnd` triggers the rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum CalendarEventType {
    SemesterStart,
    SemesterEnd,
    Holiday,
    ExamPeriod,
    Registration,
    Other,
}

wire_enum!(CalendarEventType, "calendar event type", {
    SemesterStart => "semesterStart",
    SemesterEnd => "semesterEnd",
    Holiday => "holiday",
    ExamPeriod => "examPeriod",
    Registration => "registration",
    Other => "other",
});
