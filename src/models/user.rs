//! User model and authentication claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::enums::{Department, Role};
use crate::error::AppError;

/// Registered employee
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Organizational identifier
    pub id: String,
    pub name: String,
    pub department: Department,
    pub role: Role,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Short user representation embedded in rentals
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserShort {
    pub id: String,
    pub name: String,
    pub department: Department,
    pub email: String,
}

impl From<&User> for UserShort {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            department: user.department,
            email: user.email.clone(),
        }
    }
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 100))]
    pub user_id: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub department: Department,
    #[validate(email)]
    pub email: Option<String>,
    /// Required for the operations department
    pub password: Option<String>,
}

impl LoginRequest {
    /// Trim identifiers and drop a blank email, ahead of validation
    pub fn normalize(&mut self) {
        self.user_id = self.user_id.trim().to_string();
        self.name = self.name.trim().to_string();
        self.email = self
            .email
            .take()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
    }
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserClaims {
    pub sub: String,
    pub name: String,
    pub department: Department,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Allow the user themselves or an admin
    pub fn require_self_or_admin(&self, user_id: &str) -> Result<(), AppError> {
        if self.is_admin() || self.sub == user_id {
            Ok(())
        } else {
            Err(AppError::Authorization("Cannot access another user's rentals".to_string()))
        }
    }
}

/// Login response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}
