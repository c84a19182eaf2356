// src/utils/upload.rs

use reqwest::multipart;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{config::Config, error::AppError};

/// Metadata returned to the client after a successful upload.
#[derive(Debug, Serialize)]
pub struct StoredFile {
    pub url: String,
    pub name: String,
    pub size: usize,
    pub content_type: String,
}

#[derive(Debug, Deserialize)]
struct BlobStoreResponse {
    url: String,
}

/// Client for the external blob store.
///
/// The store is an opaque collaborator: one endpoint takes a file and answers
/// with the public URL. Nothing is retried here; failures surface as 502 and
/// the client decides whether to try again.
#[derive(Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    endpoint: Option<Url>,
}

impl UploadClient {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let endpoint = match &config.blob_store_url {
            Some(raw) => Some(
                Url::parse(raw)
                    .map_err(|e| {
                        AppError::InternalServerError(format!("Invalid BLOB_STORE_URL: {}", e))
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
        })
    }

    /// Forwards the file to the blob store and returns its public URL.
    pub async fn store(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, AppError> {
        let endpoint = self
            .endpoint
            .clone()
            .ok_or_else(|| AppError::UpstreamFailure("File storage is not configured".into()))?;

        let size = bytes.len();

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str(content_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid content type: {}", e)))?;

        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("Blob store unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamFailure(format!(
                "Blob store returned {}",
                response.status()
            )));
        }

        let body: BlobStoreResponse = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("Malformed blob store reply: {}", e)))?;

        Ok(StoredFile {
            url: body.url,
            name: file_name.to_owned(),
            size,
            content_type: content_type.to_owned(),
        })
    }
}
