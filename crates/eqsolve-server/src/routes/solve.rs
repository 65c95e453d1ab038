use crate::{error::AppError, state::AppState};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

#[derive(Debug, Default)]
struct SolveRequest {
    equation: Option<Value>,
}

impl SolveRequest {
    /// Read the request body the way a JSON body parser would.
    ///
    /// Bodies that are not declared as JSON are treated as an empty object, so the request is
    /// still forwarded with no equation. Only a declared JSON body that fails to parse, or
    /// that holds a bare scalar, is rejected.
    fn from_body(headers: &HeaderMap, body: &[u8]) -> Result<Self, AppError> {
        if !is_json(headers) || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value = serde_json::from_slice::<Value>(body).map_err(|e| {
            warn!("Rejected malformed JSON body: {}", e);
            AppError::BadRequest(e.to_string())
        })?;
        match value {
            Value::Object(mut fields) => Ok(Self {
                equation: fields.remove("equation"),
            }),
            Value::Array(_) => Ok(Self::default()),
            other => Err(AppError::BadRequest(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    /// The equation as text. Nothing is validated: whatever was sent is forwarded.
    fn equation_text(&self) -> String {
        match &self.equation {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

#[derive(Debug, Serialize, Deserialize)]
struct SolveResponse {
    response: String,
}

async fn solve_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SolveResponse>, AppError> {
    let equation = SolveRequest::from_body(&headers, &body)?.equation_text();
    info!(equation = %equation, "solving equation");

    let response = state.solver.solve(&equation).await.map_err(|e| {
        error!("Failed to solve equation: {}", e);
        e
    })?;

    Ok(Json(SolveResponse { response }))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/solve-equation", post(solve_handler))
        .with_state(state)
}
