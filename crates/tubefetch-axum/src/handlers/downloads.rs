//! Download submission handler and form extractor.

use axum::Form;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header;
use axum::response::Html;
use serde::Deserialize;

use crate::error::HttpError;
use crate::state::AppState;

/// Form field carrying the media URL.
pub const DOWNLOAD_FIELD: &str = "downloadlink";

/// Body of an accepted submission.
pub const DOWNLOAD_STARTED_MESSAGE: &str =
    "Download started. Check the server console for details.";

/// Submitted download form, from a multipart or url-encoded body.
///
/// Any body that cannot be read is rejected with 400 `Invalid video URL`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadForm {
    pub downloadlink: Option<String>,
}

#[derive(Deserialize)]
struct UrlEncodedForm {
    downloadlink: Option<String>,
}

impl<S> FromRequest<S> for DownloadForm
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                tracing::debug!(error = %e, "Unreadable multipart body");
                HttpError::invalid_url()
            })?;
            return read_multipart(multipart).await;
        }

        let Form(form) = Form::<UrlEncodedForm>::from_request(req, state)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Unreadable form body");
                HttpError::invalid_url()
            })?;
        Ok(Self {
            downloadlink: form.downloadlink,
        })
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<DownloadForm, HttpError> {
    let mut form = DownloadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!(error = %e, "Malformed multipart field");
        HttpError::invalid_url()
    })? {
        if field.name() == Some(DOWNLOAD_FIELD) {
            let value = field.text().await.map_err(|e| {
                tracing::debug!(error = %e, "Unreadable multipart field");
                HttpError::invalid_url()
            })?;
            form.downloadlink = Some(value);
        }
    }
    Ok(form)
}

/// POST /download - validate the URL and start a background job.
pub async fn submit(
    State(state): State<AppState>,
    form: DownloadForm,
) -> Result<Html<&'static str>, HttpError> {
    let link = form
        .downloadlink
        .filter(|link| !link.trim().is_empty())
        .ok_or_else(HttpError::invalid_url)?;

    let handle = state.runner.submit(&link)?;
    tracing::info!(job_id = %handle.id(), "Download submitted");

    Ok(Html(DOWNLOAD_STARTED_MESSAGE))
}
