#[cfg(test)]
pub mod test_utils {
    use crate::auth::hash_password;
    use crate::config::AppConfig;
    use crate::mailer::LogMailer;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
    use axum::Router;
    use axum_test::TestServer;
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use model::entities::user::{self, UserRole};
    use moka::future::Cache;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub const ADMIN_EMAIL: &str = "admin@ums.test";
    pub const ADMIN_PASSWORD: &str = "admin-password";
    /// Password of every user created through [`create_staff`].
    pub const STAFF_PASSWORD: &str = "staff-password";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    pub fn test_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            metrics_enabled: false,
            bcrypt_cost: 4,
            ..AppConfig::default()
        }
    }

    pub async fn insert_user(db: &DatabaseConnection, name: &str, email: &str, password: &str, role: UserRole) -> user::Model {
        user::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(hash_password(password, 4).expect("Failed to hash password")),
            role: Set(role),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test user")
    }

    /// Create AppState for testing, with one admin account
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;
        insert_user(&db, "Test Admin", ADMIN_EMAIL, ADMIN_PASSWORD, UserRole::Admin).await;

        let config = test_config();
        let mailer = Arc::new(LogMailer::from_config(&config));

        AppState {
            db,
            cache: Cache::new(100),
            config: Arc::new(config),
            mailer,
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level comes from RUST_LOG and defaults to WARN.
    pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        let state = setup_test_app_state().await;
        create_router(state)
    }

    /// Test server plus the state behind it, for tests that inspect the database.
    pub async fn setup_test_server() -> (TestServer, AppState) {
        let state = setup_test_app_state().await;
        let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");
        (server, state)
    }

    pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
        let response = server
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .await;
        let body: Value = response.json();
        body["data"]["token"]
            .as_str()
            .unwrap_or_else(|| panic!("Login failed for {}: {}", email, body))
            .to_string()
    }

    pub async fn admin_token(server: &TestServer) -> String {
        login(server, ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Creates a staff user with `role` and returns its token.
    pub async fn create_staff(server: &TestServer, admin: &str, email: &str, role: &str) -> String {
        let (name, value) = bearer(admin);
        server
            .post("/api/users")
            .add_header(name, value)
            .json(&json!({
                "name": email,
                "email": email,
                "password": STAFF_PASSWORD,
                "role": role,
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        login(server, email, STAFF_PASSWORD).await
    }

    pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
        (
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).expect("Invalid header value"),
        )
    }
}
