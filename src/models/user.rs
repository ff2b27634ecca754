use serde::{Deserialize, Serialize};

use crate::credentials::UserRecord;

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub user: LoginCredentials<'a>,
}

#[derive(Debug, Serialize)]
pub struct LoginCredentials<'a> {
    pub login: &'a str,
    pub password: &'a str,
}

/// `user` is null when the backend rejects the credentials without an error
/// status.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub user: Option<SessionUser>,
}

#[derive(Debug, Deserialize)]
pub struct SessionUser {
    pub username: String,
    pub authentication_token: String,
}

impl From<SessionUser> for UserRecord {
    fn from(user: SessionUser) -> Self {
        Self {
            username: user.username,
            auth_token: user.authentication_token,
        }
    }
}
