use crate::handlers::{
    academic_calendar::{create_event, delete_event, get_event, get_events, update_event},
    applications::{
        approve_application, create_application, delete_application, get_application,
        get_applications, reject_application, update_application,
    },
    auth::{change_password, forgot_password, login, me, reset_password},
    courses::{create_course, delete_course, get_course, get_courses, update_course},
    dashboard::{get_dashboard_stats, get_recent_payments},
    departments::{
        create_department, delete_department, get_department, get_departments, update_department,
    },
    exports::export_document,
    faculties::{create_faculty, delete_faculty, get_faculties, get_faculty, update_faculty},
    health::health_check,
    payments::{create_payment, delete_payment, get_payment, get_payments, update_payment},
    reports::{get_dues_report, get_financial_report, get_payment_report},
    settings::{create_setting, delete_setting, get_setting, get_settings, update_setting},
    student_accounts::{get_student_account, get_student_accounts, update_student_account},
    students::{
        create_student, delete_student, get_student, get_student_balance, get_student_payments,
        get_students, update_student,
    },
    users::{create_user, delete_user, get_user, get_users, update_user},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use axum_prometheus::PrometheusMetricLayer;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::debug;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        // Staff users
        .route("/api/users", post(create_user).get(get_users))
        .route(
            "/api/users/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        // Faculties and departments
        .route("/api/faculties", post(create_faculty).get(get_faculties))
        .route(
            "/api/faculties/:faculty_id",
            get(get_faculty).put(update_faculty).delete(delete_faculty),
        )
        .route("/api/departments", post(create_department).get(get_departments))
        .route(
            "/api/departments/:department_id",
            get(get_department)
                .put(update_department)
                .delete(delete_department),
        )
        // Courses
        .route("/api/courses", post(create_course).get(get_courses))
        .route(
            "/api/courses/:course_id",
            get(get_course).put(update_course).delete(delete_course),
        )
        // Students
        .route("/api/students", post(create_student).get(get_students))
        .route(
            "/api/students/:student_id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/api/students/:student_id/balance", get(get_student_balance))
        .route(
            "/api/students/:student_id/accounts",
            get(crate::handlers::students::get_student_accounts),
        )
        .route("/api/students/:student_id/payments", get(get_student_payments))
        // Tuition ledger
        .route("/api/student-accounts", get(get_student_accounts))
        .route(
            "/api/student-accounts/:account_id",
            get(get_student_account).put(update_student_account),
        )
        // Admissions
        .route("/api/applications", post(create_application).get(get_applications))
        .route(
            "/api/applications/:application_id",
            get(get_application)
                .put(update_application)
                .delete(delete_application),
        )
        .route(
            "/api/applications/:application_id/approve",
            post(approve_application),
        )
        .route(
            "/api/applications/:application_id/reject",
            post(reject_application),
        )
        // Payments
        .route("/api/payments", post(create_payment).get(get_payments))
        .route(
            "/api/payments/:payment_id",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
        // Academic calendar
        .route("/api/academic-calendar", post(create_event).get(get_events))
        .route(
            "/api/academic-calendar/:event_id",
            get(get_event).put(update_event).delete(delete_event),
        )
        // Settings
        .route("/api/settings", post(create_setting).get(get_settings))
        .route(
            "/api/settings/:setting_id",
            get(get_setting).put(update_setting).delete(delete_setting),
        )
        // Dashboard and reports
        .route("/api/dashboard/stats", get(get_dashboard_stats))
        .route("/api/dashboard/recent-payments", get(get_recent_payments))
        .route("/api/reports/financial", get(get_financial_report))
        .route("/api/reports/payments", get(get_payment_report))
        .route("/api/reports/dues", get(get_dues_report))
        // Documents
        .route("/api/export/:entity/:format", get(export_document))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // The metrics recorder is process global; install it at most once.
    let router = if state.config.metrics_enabled {
        debug!("Prometheus metrics enabled on /metrics");
        let (metric_layer, metric_handle) = PrometheusMetricLayer::pair();
        router
            .route("/metrics", get(move || std::future::ready(metric_handle.render())))
            .layer(metric_layer)
    } else {
        router
    };

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
