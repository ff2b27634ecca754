pub mod deployment;
pub mod user;
