use serde::{Deserialize, Serialize};

use crate::users::PublicUser;

/// Body of `POST /register` and `POST /login`. Fields are optional so a
/// missing one becomes a validation message rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub access_token: String,
    pub user: PublicUser,
}
