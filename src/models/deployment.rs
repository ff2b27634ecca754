use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct DeploymentListResponse {
    #[serde(default)]
    pub deployments: Vec<Deployment>,
}

#[derive(Debug, Deserialize)]
pub struct DeploymentResponse {
    pub deployment: Deployment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
    #[serde(default)]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub pusher: Option<Pusher>,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pusher {
    pub username: String,
}

impl Deployment {
    pub fn pusher_name(&self) -> &str {
        self.pusher
            .as_ref()
            .map(|p| p.username.as_str())
            .unwrap_or("-")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArchiveFormat {
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "war")]
    War,
}

#[derive(Debug, Serialize)]
pub struct DeploymentCreateRequest {
    pub deployment: DeploymentParams,
}

#[derive(Debug, Serialize)]
pub struct DeploymentParams {
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    pub archive_format: ArchiveFormat,
}

impl DeploymentCreateRequest {
    pub fn new(source_url: &str, git_ref: Option<&str>, archive_format: ArchiveFormat) -> Self {
        Self {
            deployment: DeploymentParams {
                source_url: source_url.to_string(),
                git_ref: git_ref.filter(|r| !r.is_empty()).map(str::to_string),
                archive_format,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SourceResponse {
    pub source: Source,
}

/// Temporary storage slot for an archive before it is deployed.
#[derive(Debug, Deserialize)]
pub struct Source {
    pub upload_url: String,
    pub download_url: String,
}

/// One line of the deployment event stream.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl DeploymentEvent {
    /// Terminal line for this event, `None` for event types we don't display.
    pub fn render(&self) -> Option<String> {
        match self.kind.as_str() {
            "log" => self
                .data
                .get("content")
                .and_then(Value::as_str)
                .map(|content| content.trim_end_matches('\n').to_string()),
            "status" => self
                .data
                .get("status")
                .and_then(Value::as_str)
                .map(|status| format!("-----> Deployment status: {}", status)),
            "new" => {
                let id = self
                    .data
                    .get("deployment")
                    .and_then(|d| d.get("id"))
                    .and_then(Value::as_str)
                    .or(self.id.as_deref())?;
                Some(format!("-----> New deployment {}", id))
            }
            _ => None,
        }
    }
}
