//! HTTP endpoint that applies find/replace rules to uploaded PowerPoint files.
//!
//! `POST /modify-pptx` takes a multipart form with a `file` part (the .pptx)
//! and a `rules` field holding a JSON list of rules. A `name` field is
//! accepted as shorthand for replacing `{{NAME}}`.

pub mod config;
pub mod error;

use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use deck_core::ReplacementRule;
use deck_pptx::{check_filename, parse_rules_payload, process_with_rules, PPTX_CONTENT_TYPE};

pub use config::Config;
pub use error::ApiError;

/// Placeholder replaced by the `name` form field.
pub const NAME_TOKEN: &str = "{{NAME}}";

/// Build the application router.
pub fn router(config: &Config) -> Router {
    Router::new()
        .route("/modify-pptx", post(modify_pptx))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(config.body_limit()))
}

async fn health() -> &'static str {
    "ok"
}

/// Fields collected from the multipart form.
#[derive(Debug, Default)]
struct Upload {
    file: Option<(String, Vec<u8>)>,
    rules: Option<String>,
    name: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                upload.file = Some((filename, data.to_vec()));
            }
            Some("rules") => upload.rules = Some(field.text().await?),
            Some("name") => upload.name = Some(field.text().await?),
            other => log::debug!("Ignoring form field {:?}", other),
        }
    }

    Ok(upload)
}

async fn modify_pptx(multipart: Multipart) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;

    let (filename, data) = upload
        .file
        .ok_or_else(|| ApiError::bad_request("Missing file upload."))?;
    let filename = upload_basename(&filename).to_string();
    check_filename(&filename)?;

    if upload.rules.is_none() && upload.name.is_none() {
        return Err(ApiError::bad_request("Provide a rules list."));
    }

    let mut rules = match upload.rules.as_deref() {
        Some(json) => parse_rules_payload(json)?,
        None => Vec::new(),
    };
    if let Some(name) = upload.name {
        rules.push(ReplacementRule::new(NAME_TOKEN, name)?);
    }

    log::info!(
        "Received {} ({} bytes) with {} rule(s)",
        filename,
        data.len(),
        rules.len()
    );

    let result = tokio::task::spawn_blocking(move || process_with_rules(&filename, &data, &rules))
        .await
        .map_err(|e| ApiError::internal(format!("Processing task failed: {}", e)))??;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_filename(&result.filename)
    );

    Ok((
        [
            (header::CONTENT_TYPE, PPTX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        result.bytes,
    )
        .into_response())
}

/// Client-supplied filenames may carry a path; only the last component is kept.
fn upload_basename(filename: &str) -> &str {
    filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename)
}

/// Filename safe to quote in a `Content-Disposition` header.
fn header_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}
