// src/extraction/ocr_client.rs
//! HTTP client for the external text-extraction capability.
//!
//! The service does not perform OCR itself; raw document bytes are handed
//! to a configured extraction endpoint together with a media-type hint and
//! best-effort plain text comes back. Extraction quality is the endpoint's
//! concern; any failure on this path is an upstream `TextExtraction` error.

use crate::error::ServiceError;
use reqwest::Client;

/// Client for the document text-extraction endpoint.
#[derive(Clone)]
pub struct OcrClient {
    http: Client,
    /// Full URL of the extraction endpoint, e.g. `http://ocr:8090/extract`
    endpoint: String,
}

impl OcrClient {
    /// Creates a client against the given extraction endpoint.
    pub fn new(endpoint: &str) -> Self {
        OcrClient {
            http: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Sends document bytes for text extraction.
    ///
    /// # Arguments
    /// * `bytes` - Raw document content (image or PDF)
    /// * `media_type` - Content-type hint, e.g. `application/pdf`
    ///
    /// # Returns
    /// Best-effort plain text extracted from the document.
    ///
    /// # Errors
    /// Returns `ServiceError::TextExtraction` when the endpoint is
    /// unreachable or answers with a non-success status.
    pub async fn extract_text(
        &self,
        bytes: Vec<u8>,
        media_type: &str,
    ) -> Result<String, ServiceError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, media_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ServiceError::TextExtraction(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::TextExtraction(format!(
                "extraction endpoint returned {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ServiceError::TextExtraction(e.to_string()))
    }
}

/// Derives the media-type hint from the uploaded filename.
///
/// Unknown extensions fall back to `application/octet-stream`; the
/// extraction endpoint decides what it can do with those.
pub fn media_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or_default().to_lowercase();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::mock;

    #[test]
    fn test_media_type_for_known_extensions() {
        assert_eq!(media_type_for("degree.pdf"), "application/pdf");
        assert_eq!(media_type_for("scan.JPEG"), "image/jpeg");
        assert_eq!(media_type_for("scan.final.png"), "image/png");
        assert_eq!(media_type_for("noextension"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_extract_text_returns_body() {
        let _m = mock("POST", "/extract")
            .match_header("content-type", "application/pdf")
            .with_status(200)
            .with_body("Certified that Mr. John Smith has passed")
            .create();

        let client = OcrClient::new(&format!("{}/extract", mockito::server_url()));
        let text = client
            .extract_text(b"%PDF-1.4".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert_eq!(text, "Certified that Mr. John Smith has passed");
    }

    #[tokio::test]
    async fn test_extract_text_surfaces_upstream_failure() {
        let _m = mock("POST", "/extract").with_status(500).create();

        let client = OcrClient::new(&format!("{}/extract", mockito::server_url()));
        let err = client
            .extract_text(vec![1, 2, 3], "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::TextExtraction(_)));
    }
}
