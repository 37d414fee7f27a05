use axum::http::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::ApiError;

#[derive(Debug, Deserialize)]
struct UpstreamResponse {
    base64_image: Option<String>,
}

/// Client for the background removal service
#[derive(Debug, Clone)]
pub struct RemoveBgClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemoveBgClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    pub fn endpoint(&self) -> String {
        format!("{}remove_background", self.base_url)
    }

    /// Forward an image and return the cut-out as base64
    pub async fn remove_background(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("No file uploaded.".to_owned()));
        }
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_owned()));

        let response = self
            .http
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                ApiError::Internal(format!(
                    "Failed to connect to background removal service. Make sure it is running at {}. Error: {}",
                    self.base_url, err
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Upstream {
                status: StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
                message: format!("Background removal failed: {body}"),
            });
        }

        let parsed: UpstreamResponse = response
            .json()
            .await
            .map_err(|err| ApiError::Internal(format!("An unexpected error occurred: {err}")))?;
        match parsed.base64_image {
            Some(image) if !image.is_empty() => Ok(image),
            _ => Err(ApiError::Internal("Invalid response from background removal service.".to_owned())),
        }
    }
}
