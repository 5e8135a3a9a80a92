//! Common transport-layer types shared between the server and the compute layer.
//! These structs are the request/response payloads of the REST API, so the
//! domain enums here carry the exact wire spelling used by the admin frontends.

mod balance;
mod enums;
mod reports;

pub use balance::{BalanceBreakdown, BalanceStatus};
pub use enums::{
    AccountStatus, ApplicationStatus, CalendarEventType, ParseEnumError, PaymentMethod,
    PaymentType, Role,
};
pub use reports::{
    DashboardStats, DepartmentFinancialSummary, DueEntry, FinancialReport, MonthlyCollection,
    PaymentMethodTotal, PaymentReport, RolloverSummary,
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by every successful endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Label stored in `students.semester` once a student finished the last semester.
pub const GRADUATED_SEMESTER: &str = "Graduated";

/// Number of semesters a program runs when the department does not say otherwise.
pub const DEFAULT_TOTAL_SEMESTERS: i32 = 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_serializes_envelope() {
        let response = ApiResponse::ok(vec![1, 2], "Done");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Done");
        assert_eq!(json["data"][1], 2);
    }
}
