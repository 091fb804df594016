use std::path::Path;

use reqwest::multipart::{Form, Part};

use crate::endpoint::Endpoint;
use crate::envelope::{Ack, Envelope};
use crate::error::ClientResult;
use crate::models::Video;
use crate::transport::{Payload, Transport};

/// Multipart upload: `file`, `title`, `description`. The backend requires all
/// three parts, so a missing description is sent empty.
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub title: String,
    pub description: Option<String>,
}

impl VideoUpload {
    /// Read the video from disk; the file name becomes the part's file name.
    pub async fn from_path(
        path: impl AsRef<Path>,
        title: impl Into<String>,
        description: Option<String>,
    ) -> ClientResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        Ok(Self {
            file_name,
            bytes,
            title: title.into(),
            description,
        })
    }

    fn into_form(self) -> Form {
        let part = Part::bytes(self.bytes).file_name(self.file_name);
        Form::new()
            .part("file", part)
            .text("title", self.title)
            .text("description", self.description.unwrap_or_default())
    }
}

/// 视频相关接口
#[derive(Clone)]
pub struct VideoApi {
    transport: Transport,
}

impl VideoApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn list(&self) -> ClientResult<Envelope<Vec<Video>>> {
        self.transport.get(Endpoint::VideoList).await
    }

    pub async fn upload(&self, upload: VideoUpload) -> ClientResult<Ack> {
        tracing::info!("Uploading {} ({} bytes)", upload.file_name, upload.bytes.len());
        self.transport
            .ack(Endpoint::VideoUpload, Payload::Multipart(upload.into_form()))
            .await
    }

    pub async fn detail(&self, id: i64) -> ClientResult<Envelope<Video>> {
        self.transport.get(Endpoint::VideoDetail(id)).await
    }

    pub async fn mine(&self) -> ClientResult<Envelope<Vec<Video>>> {
        self.transport.get(Endpoint::MyVideos).await
    }

    pub async fn delete(&self, id: i64) -> ClientResult<Ack> {
        self.transport.ack(Endpoint::VideoDelete(id), Payload::Empty).await
    }

    pub async fn search(&self, keyword: &str) -> ClientResult<Envelope<Vec<Video>>> {
        self.transport
            .request(
                Endpoint::VideoSearch,
                Payload::Query(vec![("keyword", keyword.to_string())]),
            )
            .await
    }

    /// Download a video file by its `filePath`
    pub async fn download(&self, file_path: &str) -> ClientResult<Vec<u8>> {
        self.transport
            .bytes(
                Endpoint::VideoFile,
                Payload::Query(vec![("path", file_path.to_string())]),
            )
            .await
    }
}
