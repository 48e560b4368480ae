use async_trait::async_trait;
use common::{HealthStatus, Job, JobId, RemoteValidation, UploadReceipt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::config::ServerConfig;
use crate::error::ClientError;
use crate::form::UploadForm;

/// The two calls the upload-and-poll flow needs from the backend.
#[async_trait]
pub trait JobApi: Send + Sync + 'static {
    async fn submit(&self, form: &UploadForm) -> Result<UploadReceipt, ClientError>;
    async fn fetch_job(&self, id: &JobId) -> Result<Job, ClientError>;
}

pub struct ApiClient {
    client: Client,
    server: ServerConfig,
    base_url: String,
}

impl ApiClient {
    pub fn new(server: &ServerConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = server.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: server.base_url.trim_end_matches('/').to_string(),
            server: server.clone(),
        })
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn job_url(&self, id: &JobId) -> String {
        self.build_url(&format!("{}/{}", self.server.jobs_path.trim_end_matches('/'), id))
    }

    /// Where a completed job's artifact is served from.
    pub fn media_url(&self, output_file: &str) -> String {
        self.build_url(&common::media_path(&self.server.media_prefix, output_file))
    }

    async fn check(url: &str, response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::Status {
            url: url.to_string(),
            status,
            body,
        })
    }

    async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, ClientError> {
        let response = Self::check(url, response).await?;
        let bytes = response.bytes().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn multipart(&self, url: &str, form: &UploadForm) -> Result<Form, ClientError> {
        let mut multipart = Form::new();
        for (field, file) in form.files() {
            let bytes = tokio::fs::read(&file.path).await?;
            let part = Part::bytes(bytes)
                .file_name(file.name.clone())
                .mime_str(&file.mime)
                .map_err(|source| ClientError::Transport {
                    url: url.to_string(),
                    source,
                })?;
            multipart = multipart.part(field.to_string(), part);
        }
        if let Some((field, prompt)) = form.prompt() {
            multipart = multipart.text(field.to_string(), prompt.to_string());
        }
        Ok(multipart)
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: &UploadForm) -> Result<T, ClientError> {
        let url = self.build_url(path);
        let body = self.multipart(&url, form).await?;
        let response = self
            .client
            .post(&url)
            .multipart(body)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;
        Self::read_json(&url, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.to_string(), source })?;
        Self::read_json(url, response).await
    }

    pub async fn upload(&self, form: &UploadForm) -> Result<UploadReceipt, ClientError> {
        log::info!("Uploading {} file(s) to {}", form.files().count(), self.server.upload_path);
        let receipt: UploadReceipt = self.post_form(&self.server.upload_path, form).await?;
        log::info!("Upload accepted, job {}", receipt.job_id);
        Ok(receipt)
    }

    pub async fn job(&self, id: &JobId) -> Result<Job, ClientError> {
        self.get_json(&self.job_url(id)).await
    }

    /// Server-side pre-flight check for character/reference pairs.
    pub async fn validate_remote(&self, form: &UploadForm) -> Result<RemoteValidation, ClientError> {
        self.post_form(&self.server.validate_path, form).await
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.get_json(&self.build_url(&self.server.health_path)).await
    }

    /// Streams a completed job's artifact to `dest`, returning the byte count.
    pub async fn download_output(&self, job: &Job, dest: &Path) -> Result<u64, ClientError> {
        let output_file = job
            .output_file
            .as_deref()
            .ok_or_else(|| ClientError::NoOutput(job.id.clone()))?;
        let url = self.media_url(output_file);
        log::info!("Downloading {} to {:?}", url, dest);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;
        let mut response = Self::check(&url, response).await?;

        // Stream into a sibling file so a failed transfer never leaves a
        // truncated result at `dest`.
        let mut part = dest.as_os_str().to_owned();
        part.push(".part");
        let part = PathBuf::from(part);

        let streamed = async {
            let mut out = tokio::fs::File::create(&part).await?;
            let mut written = 0u64;
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|source| ClientError::Transport { url: url.clone(), source })?
            {
                out.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            out.flush().await?;
            Ok::<u64, ClientError>(written)
        }
        .await;

        let finished = match streamed {
            Ok(written) => tokio::fs::rename(&part, dest)
                .await
                .map(|_| written)
                .map_err(ClientError::from),
            Err(e) => Err(e),
        };
        match finished {
            Ok(written) => Ok(written),
            Err(e) => {
                log::warn!("Download of {} failed: {}", url, e);
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl JobApi for ApiClient {
    async fn submit(&self, form: &UploadForm) -> Result<UploadReceipt, ClientError> {
        self.upload(form).await
    }

    async fn fetch_job(&self, id: &JobId) -> Result<Job, ClientError> {
        self.job(id).await
    }
}
