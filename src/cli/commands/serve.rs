//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for index building, search, and grounded
//! question answering.

use crate::builder::IndexBuilder;
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::SvarError;
use crate::index::{IndexHandle, IndexSource, SqliteIndex, VectorIndex};
use crate::qa::QaEngine;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    settings: Settings,
    handle: IndexHandle,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let handle = IndexHandle::new(settings.index_path());

    let state = Arc::new(AppState { settings, handle });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/build", post(build))
        .route("/ask", post(ask))
        .route("/search", post(search))
        .route("/status", get(status))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Svar API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Build", "POST /build");
    Output::kv("Ask", "POST /ask");
    Output::kv("Search", "POST /search");
    Output::kv("Status", "GET  /status");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct BuildRequest {
    /// Path to the dataset CSV on the server's filesystem
    dataset: String,
    /// Dataset provenance recorded in the index (default, custom)
    #[serde(default)]
    source: Option<String>,
}

#[derive(Serialize)]
struct BuildResponse {
    records_indexed: usize,
    empty_responses: usize,
    dataset: String,
    source: String,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    evidence: Vec<crate::qa::Evidence>,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default = "default_min_score")]
    min_score: f32,
}

fn default_limit() -> usize {
    5
}

fn default_min_score() -> f32 {
    0.3
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<crate::qa::Evidence>,
}

#[derive(Serialize)]
struct StatusResponse {
    built: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<crate::index::IndexMeta>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Map an error to the HTTP status it should surface as.
fn error_status(err: &SvarError) -> StatusCode {
    match err {
        SvarError::IndexNotFound(_) => StatusCode::NOT_FOUND,
        SvarError::InvalidInput(_) | SvarError::Schema(_) | SvarError::Parse(_) => {
            StatusCode::BAD_REQUEST
        }
        SvarError::ServiceTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: SvarError) -> axum::response::Response {
    (
        error_status(&err),
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn build(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BuildRequest>,
) -> impl IntoResponse {
    let source: IndexSource = match req.source.as_deref().unwrap_or("custom").parse() {
        Ok(s) => s,
        Err(e) => return error_response(SvarError::InvalidInput(e)),
    };

    let builder = IndexBuilder::from_settings(&state.settings);

    match builder
        .build(Path::new(&req.dataset), &state.handle, source)
        .await
    {
        Ok(report) => Json(BuildResponse {
            records_indexed: report.records_indexed,
            empty_responses: report.empty_responses,
            dataset: report.dataset,
            source: report.source.to_string(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> impl IntoResponse {
    let mut engine = match QaEngine::from_settings(&state.settings, req.model.as_deref()) {
        Ok(engine) => engine,
        Err(e) => return error_response(e),
    };
    if let Some(k) = req.top_k {
        engine = engine.with_top_k(k);
    }

    match engine.answer(&req.question).await {
        Ok(answer) => Json(AskResponse {
            answer: answer.text,
            evidence: answer.evidence,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    let index = match SqliteIndex::open(&state.handle) {
        Ok(index) => index,
        Err(e) => return error_response(e),
    };

    let embedder = OpenAIEmbedder::with_config(
        &state.settings.embedding.model,
        state.settings.embedding.dimensions as usize,
    );

    let query_embedding = match embedder.embed(&req.query).await {
        Ok(emb) => emb,
        Err(e) => return error_response(e),
    };

    match index
        .search_with_threshold(&query_embedding, req.limit, req.min_score)
        .await
    {
        Ok(results) => Json(SearchResponse {
            results: results.into_iter().map(Into::into).collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if !state.handle.exists() {
        return Json(StatusResponse {
            built: false,
            meta: None,
        })
        .into_response();
    }

    let index = match SqliteIndex::open(&state.handle) {
        Ok(index) => index,
        Err(e) => return error_response(e),
    };

    match index.meta().await {
        Ok(meta) => Json(StatusResponse {
            built: true,
            meta: Some(meta),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}
