//! HTTP client for the platform REST API.

pub mod client;
pub mod deployments;
pub mod error;

pub use client::PlatformClient;
pub use deployments::ArchiveSource;
pub use error::ApiError;
