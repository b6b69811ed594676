use std::net::SocketAddr;

use axum::{
    http::{header::ALLOW, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth, error::ApiError, state::AppState};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .merge(auth::router(state.clone()))
        .fallback(not_found)
        .with_state(state)
        .layer(map_response(method_not_allowed_as_json))
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
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn index() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Authentication API is running",
        "endpoints": {
            "register": "/register [POST]",
            "login": "/login [POST]",
            "profile": "/profile [GET] (protected)"
        }
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// The method router answers 405 with an empty body; give it the JSON error shape.
async fn method_not_allowed_as_json(res: Response) -> Response {
    if res.status() != StatusCode::METHOD_NOT_ALLOWED {
        return res;
    }
    let mut json_res = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = res.headers().get(ALLOW) {
        json_res.headers_mut().insert(ALLOW, allow.clone());
    }
    json_res
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
