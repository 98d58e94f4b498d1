use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{auth, recipes};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(recipes::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        build_app(AppState::fake())
    }

    async fn status_of(req: Request<Body>) -> StatusCode {
        app().oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_is_open() {
        let req = Request::get("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(req).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn me_without_token_is_unauthorized() {
        let req = Request::get("/users/me").body(Body::empty()).unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }

    #[tokio::test]
    async fn token_endpoint_demands_basic_auth() {
        let req = Request::get("/token").body(Body::empty()).unwrap();
        assert_eq!(status_of(req).await, StatusCode::UNAUTHORIZED);

        let req = Request::get("/token")
            .header(header::AUTHORIZATION, "Basic %%%")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(req).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bearer_endpoints_reject_basic_scheme() {
        let req = Request::post("/recipes")
            .header(header::AUTHORIZATION, "Basic YWRhOnB3")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        assert_eq!(status_of(req).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn mutations_require_authentication() {
        for (method, uri) in [
            ("PUT", "/recipes/1"),
            ("DELETE", "/recipes/1"),
            ("POST", "/recipes/1/comments"),
            ("DELETE", "/recipes/1/comments/2"),
            ("POST", "/recipes/1/ingredients"),
            ("PUT", "/recipes/1/ingredients/2"),
            ("DELETE", "/recipes/1/instructions/2"),
            ("POST", "/recipes/1/saves"),
            ("DELETE", "/recipes/1/saves/2"),
            ("GET", "/users/me/saves"),
        ] {
            let req = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap();
            assert_eq!(status_of(req).await, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn register_requires_json_content_type() {
        let req = Request::post("/users")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("firstName=Ada"))
            .unwrap();
        assert_eq!(status_of(req).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_reports_missing_fields_before_touching_the_store() {
        let req = Request::post("/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"firstName":"Ada","username":"ada"}"#))
            .unwrap();
        assert_eq!(status_of(req).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_path_ids_get_a_json_error() {
        for uri in ["/recipes/abc", "/recipes/1/ingredients/xyz", "/recipes/1/instructions/1.5"] {
            let req = Request::get(uri).body(Body::empty()).unwrap();
            let res = app().oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(
                res.headers().get(header::CONTENT_TYPE).unwrap(),
                "application/json",
                "{uri}"
            );

            let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            let msg = body["error"].as_str().unwrap();
            assert_eq!(msg, "Resource ids in the URL must be integers");
            assert!(!msg.contains("abc") && !msg.contains("xyz"));
        }
    }
}
