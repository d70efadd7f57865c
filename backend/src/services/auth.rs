//! Authentication service: registration, login and token handling

use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{Role, User};
use crate::store::{NewUser, UserStore};

/// JWT claims carried by access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub role: Role,
    pub warehouse_id: Option<i64>,
    pub exp: i64,
    pub iat: i64,
}

/// Input for registering an end-user account
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub warehouse_id: Option<i64>,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Token response after registration or login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: i64,
    pub role: Role,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_secret: String,
    access_token_expiry: i64,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_secret: String, access_token_expiry: i64) -> Self {
        Self {
            users,
            jwt_secret,
            access_token_expiry,
        }
    }

    /// Register a new end-user account. Manager and admin accounts are
    /// provisioned out of band.
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthResponse> {
        input
            .validate()
            .map_err(|err| AppError::Validation(err.to_string()))?;

        let email = input.email.trim().to_lowercase();
        if self.users.email_exists(&email).await? {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|err| AppError::Internal(err.into()))?;
        let user = self
            .users
            .insert_user(NewUser {
                full_name: input.full_name.trim().to_string(),
                email,
                password_hash,
                role: Role::User,
                warehouse_id: input.warehouse_id,
            })
            .await?;

        self.auth_response(&user)
    }

    /// Verify credentials and issue an access token
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthResponse> {
        let email = input.email.trim().to_lowercase();
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|err| AppError::Internal(err.into()))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        self.auth_response(&user)
    }

    fn auth_response(&self, user: &User) -> AppResult<AuthResponse> {
        let access_token = self.issue_token(user)?;
        Ok(AuthResponse {
            user_id: user.id,
            role: user.role,
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    fn issue_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            warehouse_id: user.warehouse_id,
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|err| AppError::Internal(err.into()))
    }
}

/// Decode and validate an access token
pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|err| AppError::InvalidToken(err.to_string()))
}
