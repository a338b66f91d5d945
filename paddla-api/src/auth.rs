use std::sync::Arc;

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use paddla_core::AdminUserRepository;
use paddla_store::app_config::AdminConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::AppError,
    middleware::auth::{AdminClaims, ADMIN_ROLE},
    password,
    state::{AppState, AuthConfig},
};

pub const INVALID_CREDENTIALS: &str = "Felaktigt användarnamn eller lösenord";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .users
        .find_by_username(&payload.username)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let Some(user) = user else {
        warn!("Login attempt for unknown admin '{}'", payload.username);
        return Err(AppError::AuthenticationError(INVALID_CREDENTIALS.to_string()));
    };

    if !password::verify_password(&payload.password, &user.pw_hash)? {
        warn!("Wrong password for admin '{}'", user.username);
        return Err(AppError::AuthenticationError(INVALID_CREDENTIALS.to_string()));
    }

    let token = issue_token(&state.auth, &user.username)?;
    info!("Admin '{}' logged in", user.username);
    Ok(Json(AuthResponse { token }))
}

pub fn issue_token(auth: &AuthConfig, username: &str) -> Result<String, AppError> {
    let claims = AdminClaims {
        sub: username.to_owned(),
        role: ADMIN_ROLE.to_owned(),
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

/// Creates the configured admin account unless it already exists.
pub async fn seed_admin(users: &Arc<dyn AdminUserRepository>, config: &AdminConfig) -> anyhow::Result<()> {
    let (Some(username), Some(pw)) = (&config.username, &config.password) else {
        info!("No admin account configured");
        return Ok(());
    };

    let existing = users
        .find_by_username(username)
        .await
        .map_err(|e| anyhow::anyhow!("look up admin: {}", e))?;
    if existing.is_some() {
        return Ok(());
    }

    let pw_hash = password::hash_password(pw)?;
    users
        .create_user(username, &pw_hash)
        .await
        .map_err(|e| anyhow::anyhow!("create admin: {}", e))?;
    info!("Admin account '{}' created", username);
    Ok(())
}
