pub mod error;
pub mod extract;
pub mod settings;
pub mod sqlite;
pub mod users;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub use settings::Settings;
pub use sqlite::Database;

#[derive(Clone)]
pub struct AppState {
    db: Database,
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

pub fn create_app(db: Database, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(|| async { "API is running..." }))
        .nest("/api/users", users::router())
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { db })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::header;
    use axum_test::TestServer;
    use tracing_test::traced_test;

    pub async fn create_test_server() -> TestServer {
        let db = sqlite::create_pool(&sqlite::test::memory_settings())
            .await
            .unwrap();
        let app = create_app(db, &[]);

        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn test_root_endpoint() {
        let server = create_test_server().await;
        let response = server.get("/").await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.text(), "API is running...");
    }

    #[tokio::test]
    #[traced_test]
    async fn test_cors_allows_any_origin_by_default() {
        let server = create_test_server().await;
        let response = server
            .get("/api/users")
            .add_header(
                header::ORIGIN,
                HeaderValue::from_static("http://localhost:5173"),
            )
            .await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    }

    #[tokio::test]
    #[traced_test]
    async fn test_cors_restricts_to_configured_origins() {
        let db = sqlite::create_pool(&sqlite::test::memory_settings())
            .await
            .unwrap();
        let app = create_app(db, &["http://localhost:5173".to_string()]);
        let server = TestServer::new(app).unwrap();

        let response = server
            .get("/api/users")
            .add_header(
                header::ORIGIN,
                HeaderValue::from_static("http://localhost:5173"),
            )
            .await;
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            "http://localhost:5173"
        );

        let response = server
            .get("/api/users")
            .add_header(header::ORIGIN, HeaderValue::from_static("http://evil.test"))
            .await;
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
