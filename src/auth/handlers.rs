use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{CredentialsRequest, LoginResponse, UserResponse},
        gate::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
        validation::{validate_login, validate_registration},
    },
    error::{ApiError, ApiResult},
    state::AppState,
    users::{PublicUser, RepoError},
};

/// The body must be a non-empty JSON object; anything else is "No data provided".
fn body_or_reject(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<CredentialsRequest> {
    let no_data = || ApiError::Validation("No data provided".into());
    let Json(value) = payload
        .inspect_err(|e| warn!(error = %e, "unreadable request body"))
        .map_err(|_| no_data())?;
    match value {
        Value::Object(map) if !map.is_empty() => serde_json::from_value(Value::Object(map))
            .map_err(|e| {
                warn!(error = %e, "malformed credentials body");
                no_data()
            }),
        _ => {
            warn!("request body is not a non-empty JSON object");
            Err(no_data())
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let (username, password) = validate_registration(body_or_reject(payload)?)
        .inspect_err(|e| warn!(reason = %e, "registration rejected"))?;

    // `create` still rejects registrations that race past this check.
    if state.users.find_by_username(&username).await?.is_some() {
        warn!(username = %username, "username already registered");
        return Err(ApiError::from(RepoError::UsernameTaken));
    }

    let hash = hash_password_blocking(password, state.config.bcrypt_cost).await?;
    let user = state
        .users
        .create(&username, &hash)
        .await
        .inspect_err(|e| warn!(username = %username, error = %e, "create user failed"))?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User created successfully",
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, keys, payload))]
pub async fn login(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let (username, password) = validate_login(body_or_reject(payload)?)?;

    let Some(user) = state.users.find_by_username(&username).await? else {
        warn!(username = %username, "login unknown username");
        return Err(ApiError::Authentication);
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::Authentication);
    }

    let access_token = keys.issue(user.id)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful",
        access_token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip_all)]
pub async fn profile(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse {
        message: "Profile retrieved successfully",
        user: PublicUser::from(&user),
    })
}
