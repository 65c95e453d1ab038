// Export route modules
pub mod solve;
pub mod status;

use crate::{cors, state::AppState};
use axum::{http::StatusCode, middleware, Router};
use tower_http::cors::CorsLayer;

// Function to configure all routes
pub fn configure(state: AppState, cors_layer: CorsLayer) -> Router {
    Router::new()
        .merge(solve::routes(state))
        .merge(status::routes())
        // Registered before the layers so preflights to unknown paths see them too
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(cors_layer)
        .layer(middleware::from_fn(cors::preflight_no_content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{CorsSettings, DEFAULT_ALLOWED_ORIGIN};
    use axum::{body::Body, http::Request};
    use eqsolve::{
        models::events::StreamEvent,
        providers::mock::MockProvider,
        solver::{Solver, SolverConfig},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let provider = Arc::new(MockProvider::new(vec![StreamEvent::End]));
        let state = AppState::new(Solver::new(provider, SolverConfig::default()));
        let cors_layer = cors::layer(&CorsSettings {
            allowed_origins: vec![format!("{}/", DEFAULT_ALLOWED_ORIGIN)],
        })
        .unwrap();
        configure(state, cors_layer)
    }

    fn preflight(uri: &str, origin: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("OPTIONS")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_preflight_from_allowed_origin() {
        let response = app()
            .oneshot(preflight("/solve-equation", DEFAULT_ALLOWED_ORIGIN))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(
            headers["access-control-allow-origin"],
            DEFAULT_ALLOWED_ORIGIN
        );
        assert_eq!(headers["access-control-allow-credentials"], "true");
        assert_eq!(
            headers["access-control-allow-methods"],
            "GET,HEAD,PUT,PATCH,POST,DELETE"
        );
        assert_eq!(headers["access-control-allow-headers"], "content-type");
    }

    #[tokio::test]
    async fn test_preflight_to_any_path() {
        let response = app()
            .oneshot(preflight("/anything/else", DEFAULT_ALLOWED_ORIGIN))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_preflight_from_other_origin_is_not_allowed() {
        let response = app()
            .oneshot(preflight("/solve-equation", "https://evil.example.com"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(!response
            .headers()
            .contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_simple_request_gets_allow_origin() {
        let request = Request::builder()
            .uri("/status")
            .header("origin", DEFAULT_ALLOWED_ORIGIN)
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            DEFAULT_ALLOWED_ORIGIN
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let request = Request::builder()
            .uri("/solve")
            .method("POST")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
