//! Authentication and user directory service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::{AuthConfig, UsersConfig},
    error::{AppError, AppResult},
    models::{
        user::{LoginRequest, LoginResponse, UserClaims},
        Department, Role, User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    auth: AuthConfig,
    users: UsersConfig,
    /// PHC string checked for operations logins; None disables admin login
    admin_hash: Option<String>,
}

impl UsersService {
    pub fn new(repository: Repository, auth: AuthConfig, users: UsersConfig) -> AppResult<Self> {
        let admin_hash = match (&auth.admin_password_hash, &auth.admin_password) {
            (Some(hash), _) => {
                PasswordHash::new(hash)
                    .map_err(|e| AppError::Internal(format!("Invalid admin password hash: {}", e)))?;
                Some(hash.clone())
            }
            (None, Some(password)) if !password.is_empty() => Some(hash_password(password)?),
            _ => {
                tracing::warn!("No admin password configured, operations logins are disabled");
                None
            }
        };

        Ok(Self {
            repository,
            auth,
            users,
            admin_hash,
        })
    }

    /// Identify a user, register or refresh them, and issue a token.
    /// Operations staff are administrators and must give the admin password.
    pub async fn login(&self, mut request: LoginRequest) -> AppResult<LoginResponse> {
        request.normalize();
        request.validate()?;

        let role = match request.department {
            Department::Operations => {
                let password = request.password.as_deref().unwrap_or_default();
                if !self.verify_admin_password(password)? {
                    return Err(AppError::Authentication(
                        "Invalid administrator password".to_string(),
                    ));
                }
                Role::Admin
            }
            Department::Engineering => Role::User,
        };

        let user_id = request.user_id;
        let existing = self.repository.users.get_by_id(&user_id).await.ok();
        let email = request
            .email
            .or_else(|| existing.map(|u| u.email))
            .unwrap_or_else(|| format!("{}@{}", user_id, self.users.email_domain));

        let user = self
            .repository
            .users
            .upsert(User {
                id: user_id,
                name: request.name,
                department: request.department,
                role,
                email,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!("User {} logged in as {:?}", user.id, user.role);

        let token = self.create_token_for_user(&user)?;
        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.auth.jwt_expiration_hours as i64 * 3600,
            user,
        })
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.auth.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.id.clone(),
            name: user.name.clone(),
            department: user.department,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.auth.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_admin_password(&self, password: &str) -> AppResult<bool> {
        let Some(hash) = &self.admin_hash else {
            return Ok(false);
        };
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}
