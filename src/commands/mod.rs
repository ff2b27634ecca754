pub mod auth;
pub mod deploy;
pub mod deployments;
