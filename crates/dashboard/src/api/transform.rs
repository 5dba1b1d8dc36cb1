//! Auth-apply file transform.
//!
//! The backend takes a script source file and returns a protected build
//! of it. The response body is opaque bytes; the only metadata is an
//! optional download name in `Content-Disposition`.

use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};

use super::types::TransformedFile;
use super::{ApiClient, ApiError, error_from_response};

impl ApiClient {
    /// `POST /api/auth/apply` (multipart, field name `file`)
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn apply_auth(
        &self,
        access_token: &str,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<TransformedFile, ApiError> {
        let part = Part::bytes(contents).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        let response = self
            .inner
            .http
            .post(self.url("/api/auth/apply"))
            .bearer_auth(access_token)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response, "Failed to process file").await);
        }
        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(content_disposition_filename);
        let bytes = response.bytes().await?.to_vec();
        Ok(TransformedFile { file_name, bytes })
    }
}

/// Pull `filename="..."` out of a `Content-Disposition` header value.
fn content_disposition_filename(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|part| {
        let rest = part.strip_prefix("filename=")?;
        let name = rest.trim().trim_matches('"').trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_filename_extracted_from_attachment_header() {
        assert_eq!(
            content_disposition_filename("attachment; filename=\"script.auth.lua\""),
            Some("script.auth.lua".to_string())
        );
        assert_eq!(
            content_disposition_filename("attachment; filename=plain.auth.js"),
            Some("plain.auth.js".to_string())
        );
    }

    #[test]
    fn test_filename_absent_or_empty_yields_none() {
        assert_eq!(content_disposition_filename("attachment"), None);
        assert_eq!(content_disposition_filename("attachment; filename=\"\""), None);
        assert_eq!(content_disposition_filename("inline; size=42"), None);
    }

    #[tokio::test]
    async fn test_apply_auth_returns_bytes_and_header_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/apply"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-disposition", "attachment; filename=\"x.auth.lua\"")
                    .set_body_bytes(b"obfuscated".to_vec()),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let out = client
            .apply_auth("tok", "x.lua", b"print(1)".to_vec())
            .await
            .unwrap();
        assert_eq!(out.file_name.as_deref(), Some("x.auth.lua"));
        assert_eq!(out.bytes, b"obfuscated".to_vec());
    }

    #[tokio::test]
    async fn test_apply_auth_without_header_has_no_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/apply"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"obfuscated".to_vec()))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let out = client
            .apply_auth("tok", "x.lua", b"print(1)".to_vec())
            .await
            .unwrap();
        assert!(out.file_name.is_none());
    }

    #[tokio::test]
    async fn test_apply_auth_surfaces_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/apply"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"error": "Unsupported runtime"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client
            .apply_auth("tok", "x.lua", b"print(1)".to_vec())
            .await
            .unwrap_err();
        match err {
            ApiError::Api { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Unsupported runtime");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
