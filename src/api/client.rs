//! reqwest implementation of the backend API.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::error::ClientError;
use super::types::{
    ChatRequest, DocumentList, IndexReport, KnowledgeBaseStatus, ProgressFn, SelectedFile,
    UploadProgress, UploadResponse,
};
use super::{AdminApi, ChatApi, ChunkStream};
use crate::chat::turn::ContextMessage;
use crate::config::ClientConfig;

/// Upload endpoint.
pub const UPLOAD_PATH: &str = "/admin/upload_pdf/";
/// Listing endpoint.
pub const LIST_PATH: &str = "/admin/list_pdfs/";
/// Download endpoint; takes a `filename` query parameter.
pub const DOWNLOAD_PATH: &str = "/admin/download_pdf/";
/// Index generation endpoint.
pub const GENERATE_PATH: &str = "/admin/generate_vector_db/";
/// Knowledge-base readiness endpoint.
pub const STATUS_PATH: &str = "/api/vector_db_status";
/// Streaming chat endpoint.
pub const CHAT_PATH: &str = "/api/chat";

/// Multipart field carrying each uploaded file.
const UPLOAD_FIELD: &str = "pdf_files";

/// HTTP client for the document question-answering backend.
pub struct BackendClient {
    client: reqwest::Client,
    base: Url,
    config: ClientConfig,
}

impl BackendClient {
    /// Create a client for the backend described by `config`.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&config.base_url)?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "base URL cannot carry paths: {}",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| ClientError::Config(format!("HTTP client error: {e}")))?;

        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// Configuration this client was built from.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL of an endpoint path.
    ///
    /// # Errors
    /// Returns an error if the path cannot be joined onto the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    /// Absolute download URL of a stored document.
    ///
    /// # Errors
    /// Returns an error if the URL cannot be built.
    pub fn download_url(&self, name: &str) -> Result<Url, ClientError> {
        let mut url = self.endpoint(DOWNLOAD_PATH)?;
        url.query_pairs_mut().append_pair("filename", name);
        Ok(url)
    }

    /// Build the multipart form, streaming each file so progress can be reported.
    fn upload_form(&self, files: &[SelectedFile], progress: &ProgressFn) -> Result<Form, ClientError> {
        let total: u64 = files.iter().map(SelectedFile::len).sum();
        let sent = Arc::new(AtomicU64::new(0));
        let chunk_size = self.config.upload_chunk_size.max(1);

        let mut form = Form::new();
        for file in files {
            let body = progress_body(
                file.bytes.clone(),
                chunk_size,
                Arc::clone(&sent),
                total,
                Arc::clone(progress),
            );
            let part = Part::stream_with_length(body, file.len())
                .file_name(file.name.clone())
                .mime_str("application/pdf")?;
            form = form.part(UPLOAD_FIELD, part);
        }
        Ok(form)
    }
}

/// Split `bytes` into pieces and report cumulative progress as each piece is sent.
fn progress_body(
    bytes: Bytes,
    chunk_size: usize,
    sent: Arc<AtomicU64>,
    total: u64,
    on_progress: ProgressFn,
) -> reqwest::Body {
    let pieces: Vec<Bytes> = (0..bytes.len())
        .step_by(chunk_size)
        .map(|start| bytes.slice(start..(start + chunk_size).min(bytes.len())))
        .collect();

    let stream = futures::stream::iter(pieces).map(move |piece| {
        let len = piece.len() as u64;
        let loaded = sent.fetch_add(len, Ordering::Relaxed) + len;
        on_progress(UploadProgress { loaded, total });
        Ok::<Bytes, std::io::Error>(piece)
    });

    reqwest::Body::wrap_stream(stream)
}

/// Turn a non-2xx response into [`ClientError::Server`].
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Server {
        status: status.as_u16(),
        body,
    })
}

/// Check the status and decode a JSON body.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::Protocol(format!("invalid JSON body: {e}")))
}

#[async_trait]
impl AdminApi for BackendClient {
    async fn upload(
        &self,
        files: &[SelectedFile],
        progress: ProgressFn,
    ) -> Result<UploadResponse, ClientError> {
        let form = self.upload_form(files, &progress)?;
        tracing::debug!("Uploading {} file(s)", files.len());

        let response = self
            .client
            .post(self.endpoint(UPLOAD_PATH)?)
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }

    async fn list_documents(&self) -> Result<Vec<String>, ClientError> {
        let response = self.client.get(self.endpoint(LIST_PATH)?).send().await?;
        let list: DocumentList = read_json(response).await?;
        Ok(list.pdfs)
    }

    async fn generate_index(&self) -> Result<IndexReport, ClientError> {
        let response = self.client.post(self.endpoint(GENERATE_PATH)?).send().await?;
        read_json(response).await
    }

    async fn download(&self, name: &str) -> Result<Bytes, ClientError> {
        let response = self.client.get(self.download_url(name)?).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl ChatApi for BackendClient {
    async fn knowledge_base_status(&self) -> Result<KnowledgeBaseStatus, ClientError> {
        let response = self.client.get(self.endpoint(STATUS_PATH)?).send().await?;
        read_json(response).await
    }

    async fn chat_stream(&self, history: &[ContextMessage]) -> Result<ChunkStream, ClientError> {
        let response = self
            .client
            .post(self.endpoint(CHAT_PATH)?)
            .timeout(self.config.stream_timeout)
            .json(&ChatRequest { history })
            .send()
            .await?;
        let response = ensure_success(response).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Err(ClientError::Protocol("chat response has no body".to_string()));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from))
            .boxed())
    }
}
