use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::multipart;

/// Opaque identifier of a published post, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostId(pub String);

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The platform upload capability.
///
/// The pipeline treats this as a black box: it hands over image bytes and a
/// final caption and gets back a post id or an error. Implementations own
/// authentication, retries, and timeouts; the pipeline calls `upload` at
/// most once per run and never retries internally.
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Display name of this uploader (for logs).
    fn name(&self) -> &str;
    /// Publish one image with its caption.
    async fn upload(&self, image: &[u8], caption: &str) -> Result<PostId>;
}

/// Uploader speaking a plain HTTP contract: multipart POST with an `image`
/// part and a `caption` field, bearer-token auth, JSON `{"id": ...}` reply.
pub struct HttpUploader {
    endpoint: String,
    access_token: String,
    client: Client,
}

impl HttpUploader {
    pub fn new(endpoint: String, access_token: String) -> Self {
        Self {
            endpoint,
            access_token,
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Uploader for HttpUploader {
    fn name(&self) -> &str {
        "http"
    }

    async fn upload(&self, image: &[u8], caption: &str) -> Result<PostId> {
        let part = multipart::Part::bytes(image.to_vec())
            .file_name("photo")
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new()
            .text("caption", caption.to_string())
            .part("image", part);

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await
            .context("Upload request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read upload response")?;

        if !status.is_success() {
            anyhow::bail!("Upload endpoint error ({status}): {text}");
        }

        let json: serde_json::Value =
            serde_json::from_str(&text).context("Failed to parse upload response JSON")?;
        let id = json["id"]
            .as_str()
            .map(str::to_string)
            .or_else(|| json["id"].as_u64().map(|v| v.to_string()))
            .context("No post id in upload response")?;

        Ok(PostId(id))
    }
}
