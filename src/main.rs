use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

mod extract;
mod models;

use extract::ExtractionError;
use models::ExtractRequest;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let client = extract::build_client().expect("failed to build HTTP client");

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await.unwrap();
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app(client)).await.unwrap();
}

fn app(client: reqwest::Client) -> Router {
    Router::new()
        .route("/extract-images", post(extract_images_endpoint))
        .with_state(client)
}

async fn extract_images_endpoint(
    State(client): State<reqwest::Client>,
    Json(req): Json<ExtractRequest>,
) -> Response {
    let url = req
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    let Some(url) = url else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Missing 'url' in request body"})),
        )
            .into_response();
    };

    tracing::debug!(url, "extracting images");

    match extract::extract_images(&client, url).await {
        Ok(urls) => (StatusCode::OK, Json(urls)).into_response(),
        Err(e) => {
            let status = match &e {
                ExtractionError::UpstreamStatus(code) => {
                    StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                ExtractionError::InvalidUrl(_) | ExtractionError::Network(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            tracing::warn!(url, %status, "extraction failed: {}", e);
            (status, Json(json!({"detail": e.to_string()}))).into_response()
        }
    }
}
