#[cfg(test)]
pub mod test_utils {
    use crate::auth::AuthConfig;
    use crate::router::create_router;
    use crate::schemas::{ApiResponse, AppState};
    use axum::Router;
    use axum::http::{HeaderName, HeaderValue, StatusCode, header::AUTHORIZATION};
    use axum_test::TestServer;
    use common::{LoginForm, RegisterForm};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use std::sync::Arc;
    use std::time::Duration;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub const TEST_PASSWORD: &str = "correct-horse-battery";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;
        AppState {
            db,
            auth: Arc::new(AuthConfig::new("test-secret", 15)),
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level follows the RUST_LOG environment variable and
    /// defaults to WARN.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
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

    /// Create axum app for testing, returning its state for direct database checks
    pub async fn setup_test_app() -> (Router, AppState) {
        let _ = init_test_tracing();

        let state = setup_test_app_state().await;
        let router = create_router(state.clone(), Duration::from_secs(30));
        (router, state)
    }

    /// A test server over a fresh database
    pub async fn setup_test_server() -> (TestServer, AppState) {
        let (app, state) = setup_test_app().await;
        let server = TestServer::new(app).expect("Failed to start test server");
        (server, state)
    }

    pub fn register_form(username: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password1: TEST_PASSWORD.to_string(),
            password2: TEST_PASSWORD.to_string(),
        }
    }

    /// Bearer authorization header for `token`
    pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
        (
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header value"),
        )
    }

    /// Registered and logged-in user
    pub struct Member {
        pub user_id: i32,
        pub profile_id: i32,
        pub token: String,
    }

    impl Member {
        pub fn auth(&self) -> (HeaderName, HeaderValue) {
            bearer(&self.token)
        }
    }

    /// Register `username`, log in and load their profile
    pub async fn create_member(server: &TestServer, username: &str) -> Member {
        let response = server
            .post("/api/v1/register")
            .json(&register_form(username))
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        let registered: ApiResponse<serde_json::Value> = response.json();
        let user_id = registered.data["id"].as_i64().unwrap() as i32;

        let response = server
            .post("/api/v1/login")
            .json(&LoginForm {
                username: username.to_string(),
                password: TEST_PASSWORD.to_string(),
            })
            .await;
        response.assert_status(StatusCode::OK);
        let login: ApiResponse<serde_json::Value> = response.json();
        let token = login.data["access_token"].as_str().unwrap().to_string();

        let (name, value) = bearer(&token);
        let response = server.get("/api/v1/profile").add_header(name, value).await;
        response.assert_status(StatusCode::OK);
        let page: ApiResponse<serde_json::Value> = response.json();
        let profile_id = page.data["profile"]["id"].as_i64().unwrap() as i32;

        Member {
            user_id,
            profile_id,
            token,
        }
    }
}
