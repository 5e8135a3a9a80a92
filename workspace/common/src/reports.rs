use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::balance::BalanceStatus;
use crate::enums::PaymentMethod;

/// Outcome of one semester rollover batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RolloverSummary {
    /// Semester the batch rolled over from
    pub semester: String,
    pub academic_year: String,
    /// Students matched by department and semester
    pub processed: u64,
    /// Students moved to the next semester
    pub promoted: u64,
    /// Students past the final semester, now inactive
    pub graduated: u64,
    /// New ledger rows created for the next semester
    pub accounts_created: u64,
    /// Promotions whose next-semester ledger row already existed
    pub skipped_existing_accounts: u64,
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_students: u64,
    pub active_students: u64,
    pub graduated_students: u64,
    pub faculties: u64,
    pub departments: u64,
    pub courses: u64,
    pub pending_applications: u64,
    #[schema(value_type = String)]
    pub total_billed: Decimal,
    #[schema(value_type = String)]
    pub total_collected: Decimal,
    #[schema(value_type = String)]
    pub total_outstanding: Decimal,
}

/// Money totals for the students of one department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DepartmentFinancialSummary {
    pub department_id: i32,
    pub department_name: String,
    pub student_count: u64,
    #[schema(value_type = String)]
    pub billed: Decimal,
    #[schema(value_type = String)]
    pub discounts: Decimal,
    #[schema(value_type = String)]
    pub scholarships: Decimal,
    #[schema(value_type = String)]
    pub forwarded: Decimal,
    #[schema(value_type = String)]
    pub collected: Decimal,
    #[schema(value_type = String)]
    pub outstanding: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinancialReport {
    pub departments: Vec<DepartmentFinancialSummary>,
    #[schema(value_type = String)]
    pub total_billed: Decimal,
    #[schema(value_type = String)]
    pub total_collected: Decimal,
    #[schema(value_type = String)]
    pub total_outstanding: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethodTotal {
    pub method: PaymentMethod,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyCollection {
    /// Month in `YYYY-MM` form
    pub month: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub count: u64,
}

/// Payments collected in a date range, grouped by method and by month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentReport {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub payment_count: u64,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub by_method: Vec<PaymentMethodTotal>,
    pub by_month: Vec<MonthlyCollection>,
}

/// A student who still owes money on the current ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DueEntry {
    pub student_id: i32,
    pub student_code: String,
    pub name: String,
    pub department_id: i32,
    pub semester: String,
    pub academic_year: String,
    #[schema(value_type = String)]
    pub balance: Decimal,
    pub status: BalanceStatus,
}
