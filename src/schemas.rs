use common::{
    AccountStatus, ApplicationStatus, BalanceBreakdown, BalanceStatus, CalendarEventType,
    DashboardStats, DepartmentFinancialSummary, DueEntry, FinancialReport, MonthlyCollection,
    PaymentMethod, PaymentMethodTotal, PaymentReport, PaymentType, Role, RolloverSummary,
};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

pub use common::ApiResponse;

use crate::config::AppConfig;
use crate::handlers::{
    academic_calendar::{CalendarEventRequest, CalendarEventResponse, CalendarEventWithRollover},
    applications::{ApplicationResponse, CreateApplicationRequest, DecisionRequest, UpdateApplicationRequest},
    auth::{
        ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse,
        ResetPasswordRequest,
    },
    courses::{CourseResponse, CreateCourseRequest, UpdateCourseRequest},
    departments::{CreateDepartmentRequest, DepartmentResponse, UpdateDepartmentRequest},
    faculties::{CreateFacultyRequest, FacultyResponse, UpdateFacultyRequest},
    payments::{CreatePaymentRequest, PaymentResponse, RecordedPaymentResponse, UpdatePaymentRequest},
    settings::{SettingRequest, SettingResponse},
    student_accounts::{StudentAccountResponse, UpdateStudentAccountRequest},
    students::{
        AdmissionResponse, CreateStudentRequest, EnrollmentResponse, StudentBalanceResponse,
        StudentResponse, UpdateStudentRequest,
    },
    users::{CreateUserRequest, UpdateUserRequest, UserResponse},
};
use crate::mailer::Mailer;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for expensive operations
    pub cache: Cache<String, CachedData>,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    DashboardStats(DashboardStats),
}

/// Cache key of the dashboard numbers; dropped by every write that moves them.
pub const DASHBOARD_STATS_KEY: &str = "dashboard_stats";

impl AppState {
    pub async fn invalidate_dashboard(&self) {
        self.cache.invalidate(DASHBOARD_STATS_KEY).await;
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Success status (always false for errors)
    pub success: bool,
    /// Human readable error message
    pub message: String,
    /// Machine readable error code
    pub code: String,
    /// Extra detail, when there is any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::auth::change_password,
        crate::handlers::auth::forgot_password,
        crate::handlers::auth::reset_password,
        crate::handlers::users::create_user,
        crate::handlers::users::get_users,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::faculties::create_faculty,
        crate::handlers::faculties::get_faculties,
        crate::handlers::faculties::get_faculty,
        crate::handlers::faculties::update_faculty,
        crate::handlers::faculties::delete_faculty,
        crate::handlers::departments::create_department,
        crate::handlers::departments::get_departments,
        crate::handlers::departments::get_department,
        crate::handlers::departments::update_department,
        crate::handlers::departments::delete_department,
        crate::handlers::courses::create_course,
        crate::handlers::courses::get_courses,
        crate::handlers::courses::get_course,
        crate::handlers::courses::update_course,
        crate::handlers::courses::delete_course,
        crate::handlers::students::create_student,
        crate::handlers::students::get_students,
        crate::handlers::students::get_student,
        crate::handlers::students::update_student,
        crate::handlers::students::delete_student,
        crate::handlers::students::get_student_balance,
        crate::handlers::students::get_student_accounts,
        crate::handlers::students::get_student_payments,
        crate::handlers::student_accounts::get_student_accounts,
        crate::handlers::student_accounts::get_student_account,
        crate::handlers::student_accounts::update_student_account,
        crate::handlers::applications::create_application,
        crate::handlers::applications::get_applications,
        crate::handlers::applications::get_application,
        crate::handlers::applications::update_application,
        crate::handlers::applications::delete_application,
        crate::handlers::applications::approve_application,
        crate::handlers::applications::reject_application,
        crate::handlers::payments::create_payment,
        crate::handlers::payments::get_payments,
        crate::handlers::payments::get_payment,
        crate::handlers::payments::update_payment,
        crate::handlers::payments::delete_payment,
        crate::handlers::academic_calendar::create_event,
        crate::handlers::academic_calendar::get_events,
        crate::handlers::academic_calendar::get_event,
        crate::handlers::academic_calendar::update_event,
        crate::handlers::academic_calendar::delete_event,
        crate::handlers::settings::create_setting,
        crate::handlers::settings::get_settings,
        crate::handlers::settings::get_setting,
        crate::handlers::settings::update_setting,
        crate::handlers::settings::delete_setting,
        crate::handlers::dashboard::get_dashboard_stats,
        crate::handlers::dashboard::get_recent_payments,
        crate::handlers::reports::get_financial_report,
        crate::handlers::reports::get_payment_report,
        crate::handlers::reports::get_dues_report,
        crate::handlers::exports::export_document,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            Role,
            AccountStatus,
            ApplicationStatus,
            BalanceStatus,
            CalendarEventType,
            PaymentMethod,
            PaymentType,
            BalanceBreakdown,
            RolloverSummary,
            DashboardStats,
            DepartmentFinancialSummary,
            FinancialReport,
            PaymentMethodTotal,
            MonthlyCollection,
            PaymentReport,
            DueEntry,
            LoginRequest,
            LoginResponse,
            ChangePasswordRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            CreateUserRequest,
            UpdateUserRequest,
            UserResponse,
            CreateFacultyRequest,
            UpdateFacultyRequest,
            FacultyResponse,
            CreateDepartmentRequest,
            UpdateDepartmentRequest,
            DepartmentResponse,
            CreateCourseRequest,
            UpdateCourseRequest,
            CourseResponse,
            CreateStudentRequest,
            UpdateStudentRequest,
            StudentResponse,
            StudentBalanceResponse,
            EnrollmentResponse,
            AdmissionResponse,
            StudentAccountResponse,
            UpdateStudentAccountRequest,
            CreateApplicationRequest,
            UpdateApplicationRequest,
            DecisionRequest,
            ApplicationResponse,
            CreatePaymentRequest,
            UpdatePaymentRequest,
            PaymentResponse,
            RecordedPaymentResponse,
            CalendarEventRequest,
            CalendarEventResponse,
            CalendarEventWithRollover,
            SettingRequest,
            SettingResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Sign-in and password management"),
        (name = "users", description = "Staff accounts"),
        (name = "faculties", description = "Faculty management"),
        (name = "departments", description = "Department management"),
        (name = "courses", description = "Course catalogue"),
        (name = "students", description = "Student records and balances"),
        (name = "student-accounts", description = "Per-semester tuition ledger"),
        (name = "applications", description = "Admission applications"),
        (name = "payments", description = "Payment recording"),
        (name = "academic-calendar", description = "Academic calendar and semester rollover"),
        (name = "settings", description = "Institution settings"),
        (name = "dashboard", description = "Dashboard numbers"),
        (name = "reports", description = "Financial reports"),
        (name = "exports", description = "PDF and Excel exports"),
    ),
    info(
        title = "University Management System API",
        description = "Administrative backend for student records, admissions, tuition and payments",
        version = "0.1.0",
    )
)]
pub struct ApiDoc;
