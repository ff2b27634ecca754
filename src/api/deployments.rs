use std::io;
use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::Client;
use tokio::fs::File;
use tokio_util::codec::{BytesCodec, FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tracing::{debug, info};

use super::ApiError;
use super::client::PlatformClient;
use crate::models::deployment::{
    ArchiveFormat, Deployment, DeploymentCreateRequest, DeploymentEvent, DeploymentListResponse,
    DeploymentResponse, SourceResponse,
};

/// Where the archive to deploy comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    Local(PathBuf),
    Remote(String),
}

impl ArchiveSource {
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ArchiveSource::Remote(location.to_string())
        } else {
            ArchiveSource::Local(PathBuf::from(location))
        }
    }
}

impl PlatformClient {
    /// List deployments of an app, most recent first.
    pub async fn list_deployments(&self, app: &str) -> Result<Vec<Deployment>, ApiError> {
        let url = self.url(&format!("/v1/apps/{}/deployments", app));

        let resp = self
            .with_auth(self.http.get(&url))
            .header("Accept", "application/json")
            .send()
            .await?;

        let list: DeploymentListResponse = Self::json(resp, "deployment list").await?;
        let mut deployments = list.deployments;
        deployments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(deployments)
    }

    /// Full build output of one deployment.
    pub async fn deployment_log(&self, app: &str, deployment_id: &str) -> Result<String, ApiError> {
        let url = self.url(&format!(
            "/v1/apps/{}/deployments/{}/output",
            app, deployment_id
        ));

        let resp = self
            .with_auth(self.http.get(&url))
            .header("Accept", "text/plain")
            .send()
            .await?;

        let resp = match Self::check(resp).await {
            Err(ApiError::NotFound(_)) => {
                return Err(ApiError::NotFound(format!(
                    "deployment {} of app {}",
                    deployment_id, app
                )));
            }
            other => other?,
        };

        Ok(resp.text().await?)
    }

    /// Live deployment events of an app, one per line of the response body.
    ///
    /// The stream ends when the platform closes the connection.
    pub async fn stream_deployment_events(
        &self,
        app: &str,
    ) -> Result<impl Stream<Item = Result<DeploymentEvent, ApiError>> + use<>, ApiError> {
        let url = self.url(&format!("/v1/apps/{}/deployments/stream", app));

        // No overall timeout: the connection stays open for as long as the user follows.
        let http = Client::builder().build()?;
        let resp = self
            .with_auth(http.get(&url))
            .header("Accept", "application/x-ndjson")
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        info!(app, "following deployment events");

        let body = resp.bytes_stream().map_err(io::Error::other);
        let lines = FramedRead::new(StreamReader::new(body), LinesCodec::new());

        Ok(lines.filter_map(|line| async move {
            match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(serde_json::from_str::<DeploymentEvent>(&line).map_err(|e| {
                    ApiError::InvalidResponse(format!("Failed to parse deployment event: {}", e))
                })),
                Err(e) => Some(Err(ApiError::InvalidResponse(format!(
                    "Deployment stream interrupted: {}",
                    e
                )))),
            }
        }))
    }

    /// Reserve a temporary source slot and stream a local archive into it.
    /// Returns the URL the platform will fetch the archive from.
    pub async fn upload_archive(&self, file_path: &Path) -> Result<String, ApiError> {
        let resp = self
            .with_auth(self.http.post(self.url("/v1/sources")))
            .header("Accept", "application/json")
            .send()
            .await?;
        let slot: SourceResponse = Self::json(resp, "source response").await?;

        let file_size = tokio::fs::metadata(file_path)
            .await
            .map_err(|e| archive_error(file_path, e))?
            .len();
        let file = File::open(file_path)
            .await
            .map_err(|e| archive_error(file_path, e))?;

        let stream = FramedRead::new(file, BytesCodec::new());
        let body = reqwest::Body::wrap_stream(stream);

        debug!(path = %file_path.display(), file_size, "uploading archive");
        let resp = self
            .http
            .put(&slot.source.upload_url)
            .header("Content-Type", "application/octet-stream")
            .header("Content-Length", file_size)
            .body(body)
            .send()
            .await?;
        Self::check(resp).await?;

        Ok(slot.source.download_url)
    }

    /// Create a deployment from an archive, uploading it first when local.
    pub async fn trigger_deployment(
        &self,
        app: &str,
        archive: &ArchiveSource,
        git_ref: Option<&str>,
        format: ArchiveFormat,
    ) -> Result<Deployment, ApiError> {
        let source_url = match archive {
            ArchiveSource::Remote(url) => url.clone(),
            ArchiveSource::Local(path) => self.upload_archive(path).await?,
        };

        let url = self.url(&format!("/v1/apps/{}/deployments", app));
        let resp = self
            .with_auth(self.http.post(&url))
            .header("Accept", "application/json")
            .json(&DeploymentCreateRequest::new(&source_url, git_ref, format))
            .send()
            .await?;

        let created: DeploymentResponse = Self::json(resp, "deployment response").await?;
        Ok(created.deployment)
    }
}

fn archive_error(path: &Path, source: io::Error) -> ApiError {
    ApiError::Archive {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_source_detects_urls() {
        assert_eq!(
            ArchiveSource::parse("https://example.com/archive.tar.gz"),
            ArchiveSource::Remote("https://example.com/archive.tar.gz".to_string())
        );
        assert_eq!(
            ArchiveSource::parse("HTTP://example.com/a.war"),
            ArchiveSource::Remote("HTTP://example.com/a.war".to_string())
        );
        assert_eq!(
            ArchiveSource::parse("./build/archive.tar.gz"),
            ArchiveSource::Local(PathBuf::from("./build/archive.tar.gz"))
        );
    }
}
