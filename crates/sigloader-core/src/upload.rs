//! Multipart upload of the finished signature PNG.
//!
//! The endpoint stores the file and answers with JSON of the form
//! `{ "files": [ { "url": "https://..." } ] }`; the first URL is the link
//! handed back to the user.

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::UploadConfig;

const PNG_MIME: &str = "image/png";

/// Errors produced while uploading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// The endpoint answered with a non-success status.
    #[error("Network response was not ok")]
    NotOk { status: u16 },

    /// The request never completed; carries the transport's message.
    #[error("{0}")]
    Request(String),

    /// The body was not the expected JSON document.
    #[error("Malformed upload response: {0}")]
    MalformedResponse(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    files: Vec<UploadedFile>,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    url: String,
}

/// Extract the shareable link from an upload response body.
pub fn parse_upload_response(body: &[u8]) -> Result<String, UploadError> {
    let response: UploadResponse = serde_json::from_slice(body)
        .map_err(|e| UploadError::MalformedResponse(e.to_string()))?;
    response
        .files
        .into_iter()
        .next()
        .map(|file| file.url)
        .ok_or_else(|| UploadError::MalformedResponse("no files in response".to_string()))
}

/// Posts PNGs to the configured endpoint.
#[derive(Debug, Clone)]
pub struct Uploader {
    http: reqwest::Client,
    endpoint: String,
    field_name: String,
    file_name: String,
}

impl Uploader {
    pub fn new(config: &UploadConfig) -> Result<Self, UploadError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(std::time::Duration::from_secs(config.timeout_secs));
        let http = builder
            .build()
            .map_err(|e| UploadError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            field_name: config.field_name.clone(),
            file_name: config.file_name.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload `png` and return the shareable link.
    pub async fn upload(&self, png: Vec<u8>) -> Result<String, UploadError> {
        let size = png.len();
        let part = reqwest::multipart::Part::bytes(png)
            .file_name(self.file_name.clone())
            .mime_str(PNG_MIME)
            .map_err(|e| UploadError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part(self.field_name.clone(), part);

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, endpoint = %self.endpoint, "upload request failed");
                UploadError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), endpoint = %self.endpoint, "upload rejected");
            return Err(UploadError::NotOk {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UploadError::Request(e.to_string()))?;
        let link = parse_upload_response(&body)?;
        info!(bytes = size, %link, "signature uploaded");
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let link = parse_upload_response(br#"{"files":[{"url":"https://x/y"}]}"#).unwrap();
        assert_eq!(link, "https://x/y");
    }

    #[test]
    fn test_parse_takes_first_file() {
        let link = parse_upload_response(
            br#"{"files":[{"url":"https://a/1","size":3},{"url":"https://b/2"}],"ok":true}"#,
        )
        .unwrap();
        assert_eq!(link, "https://a/1");
    }

    #[test]
    fn test_parse_empty_files() {
        let result = parse_upload_response(br#"{"files":[]}"#);
        assert!(matches!(result, Err(UploadError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_not_json() {
        let result = parse_upload_response(b"<html>oops</html>");
        assert!(matches!(result, Err(UploadError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_missing_url() {
        let result = parse_upload_response(br#"{"files":[{"name":"signature.png"}]}"#);
        assert!(matches!(result, Err(UploadError::MalformedResponse(_))));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            UploadError::NotOk { status: 502 }.to_string(),
            "Network response was not ok"
        );
        assert_eq!(
            UploadError::Request("connection refused".to_string()).to_string(),
            "connection refused"
        );
    }

    #[test]
    fn test_uploader_from_config() {
        let uploader = Uploader::new(&UploadConfig::default()).unwrap();
        assert_eq!(
            uploader.endpoint(),
            "https://msword-signature-proxy.johan-tre.workers.dev/"
        );
    }
}
