//! Backend HTTP contract.
//!
//! The controllers only see the [`AdminApi`] and [`ChatApi`] traits;
//! [`BackendClient`] is the reqwest implementation used at runtime.

pub mod client;
pub mod error;
pub mod types;

pub use client::BackendClient;
pub use error::{ClientError, ErrorKind};
pub use types::{
    DocumentList, IndexReport, KnowledgeBaseStatus, ProgressFn, SelectedFile, UploadProgress,
    UploadResponse,
};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::chat::turn::ContextMessage;

/// Streamed body of a chat answer, chunk by chunk in arrival order.
pub type ChunkStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// Document management endpoints.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Upload every file in one multipart request, reporting byte progress.
    async fn upload(
        &self,
        files: &[SelectedFile],
        progress: ProgressFn,
    ) -> Result<UploadResponse, ClientError>;

    /// Names of the stored documents.
    async fn list_documents(&self) -> Result<Vec<String>, ClientError>;

    /// Build or rebuild the search index.
    async fn generate_index(&self) -> Result<IndexReport, ClientError>;

    /// Fetch one stored document.
    async fn download(&self, name: &str) -> Result<Bytes, ClientError>;
}

/// Chat endpoints.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Whether the knowledge base exists.
    async fn knowledge_base_status(&self) -> Result<KnowledgeBaseStatus, ClientError>;

    /// Ask a question; `history` is the context window ending with the question.
    async fn chat_stream(&self, history: &[ContextMessage]) -> Result<ChunkStream, ClientError>;
}
