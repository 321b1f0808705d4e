use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::models::{AppState, MessageResponse, SplitQuery};
use crate::records::encode_records;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/splitedfile", get(split_file))
        .with_state(state)
}

/// GET /splitedfile?filename=<name>&n=<count> - next window of a dataset as CSV
async fn split_file(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Response> {
    let query = SplitQuery::from_pairs(pairs);
    let filename = query
        .filename
        .clone()
        .ok_or_else(|| AppError::NotFound("<no filename>".to_string()))?;

    let window = state.store.fetch(&filename, query.count()).await?;
    if window.is_empty() {
        return Ok((
            StatusCode::NO_CONTENT,
            Json(MessageResponse::new("No more records available.")),
        )
            .into_response());
    }

    let body = encode_records(&window).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment(&format!("split_{}", filename)),
            ),
        ],
        body,
    )
        .into_response())
}

/// `Content-Disposition` value for a download named `name`.
fn attachment(name: &str) -> String {
    let plain = name
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\');
    if plain {
        return format!("attachment; filename=\"{}\"", name);
    }

    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '?'
            }
        })
        .collect();
    let mut encoded = String::with_capacity(name.len() * 3);
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}
