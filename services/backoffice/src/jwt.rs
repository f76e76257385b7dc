//! JWT service for access and refresh token generation and validation
//!
//! Access and refresh tokens are signed with HS256 using separate secrets.
//! Both carry the admin's id, username, and email as claims.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::Admin;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret for signing access tokens
    pub access_secret: String,
    /// Secret for signing refresh tokens
    pub refresh_secret: String,
    /// Access token expiration time in seconds (default: 3 days)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Secret for signing access tokens
    /// - `JWT_REFRESH_SECRET`: Secret for signing refresh tokens
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 259200)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let access_secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let refresh_secret = std::env::var("JWT_REFRESH_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_REFRESH_SECRET environment variable not set"))?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "259200".to_string()) // 3 days
            .parse()
            .unwrap_or(259_200);

        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()
            .unwrap_or(604_800);

        Ok(JwtConfig {
            access_secret,
            refresh_secret,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Admin ID
    pub sub: Uuid,
    /// Admin username
    pub username: String,
    /// Admin email
    pub email: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Signed token pair issued at login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let access_encoding_key = EncodingKey::from_secret(config.access_secret.as_bytes());
        let access_decoding_key = DecodingKey::from_secret(config.access_secret.as_bytes());
        let refresh_encoding_key = EncodingKey::from_secret(config.refresh_secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            access_encoding_key,
            access_decoding_key,
            refresh_encoding_key,
            validation,
            config,
        }
    }

    fn now() -> Result<u64> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();
        Ok(now)
    }

    fn claims(&self, admin: &Admin, token_type: TokenType, expiry: u64) -> Result<Claims> {
        let now = Self::now()?;
        Ok(Claims {
            sub: admin.id,
            username: admin.username.clone().unwrap_or_default(),
            email: admin.email.clone().unwrap_or_default(),
            iat: now,
            exp: now + expiry,
            token_type,
        })
    }

    /// Generate an access token for an admin
    pub fn generate_access_token(&self, admin: &Admin) -> Result<String> {
        let claims = self.claims(admin, TokenType::Access, self.config.access_token_expiry)?;
        let token = encode(&Header::default(), &claims, &self.access_encoding_key)?;
        Ok(token)
    }

    /// Generate a refresh token for an admin
    pub fn generate_refresh_token(&self, admin: &Admin) -> Result<String> {
        let claims = self.claims(admin, TokenType::Refresh, self.config.refresh_token_expiry)?;
        let token = encode(&Header::default(), &claims, &self.refresh_encoding_key)?;
        Ok(token)
    }

    /// Generate the access/refresh token pair issued at login
    pub fn generate_token_pair(&self, admin: &Admin) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate_access_token(admin)?,
            refresh_token: self.generate_refresh_token(admin)?,
            expires_in: self.config.access_token_expiry,
        })
    }

    /// Validate an access token and return the claims
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.access_decoding_key, &self.validation)?;
        if token_data.claims.token_type != TokenType::Access {
            anyhow::bail!("Token is not an access token");
        }
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Admin;
    use chrono::Utc;
    use serial_test::serial;

    fn test_config() -> JwtConfig {
        JwtConfig {
            access_secret: "access-secret-for-tests".to_string(),
            refresh_secret: "refresh-secret-for-tests".to_string(),
            access_token_expiry: 259_200,
            refresh_token_expiry: 604_800,
        }
    }

    fn test_admin() -> Admin {
        Admin {
            id: Uuid::new_v4(),
            first_name: Some("Test".to_string()),
            last_name: Some("Admin".to_string()),
            phone: Some("1234567890".to_string()),
            username: Some("test_admin".to_string()),
            email: Some("test@admin.com".to_string()),
            password_hash: "hash".to_string(),
            photo: None,
            last_login: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: None,
            updated_by: None,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
            deleted_reason: None,
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = JwtService::new(test_config());
        let admin = test_admin();

        let token = service.generate_access_token(&admin).unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.username, "test_admin");
        assert_eq!(claims.email, "test@admin.com");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_is_rejected_as_access_token() {
        let service = JwtService::new(test_config());
        let admin = test_admin();

        let refresh = service.generate_refresh_token(&admin).unwrap();
        assert!(service.validate_access_token(&refresh).is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let service = JwtService::new(test_config());
        let admin = test_admin();

        let mut token = service.generate_access_token(&admin).unwrap();
        token.push('x');
        assert!(service.validate_access_token(&token).is_err());
    }

    #[test]
    #[serial]
    fn test_jwt_config_from_env() {
        unsafe {
            std::env::set_var("JWT_SECRET", "access-secret");
            std::env::set_var("JWT_REFRESH_SECRET", "refresh-secret");
        }

        let config = JwtConfig::from_env().unwrap();
        assert_eq!(config.access_secret, "access-secret");
        assert_eq!(config.refresh_secret, "refresh-secret");
        assert_eq!(config.access_token_expiry, 259_200);
        assert_eq!(config.refresh_token_expiry, 604_800);

        unsafe {
            std::env::remove_var("JWT_SECRET");
            std::env::remove_var("JWT_REFRESH_SECRET");
        }
    }

    #[test]
    #[serial]
    fn test_jwt_config_missing_secret() {
        unsafe {
            std::env::remove_var("JWT_SECRET");
            std::env::remove_var("JWT_REFRESH_SECRET");
        }

        assert!(JwtConfig::from_env().is_err());
    }

    #[test]
    fn test_token_pair_expiry() {
        let service = JwtService::new(test_config());
        let pair = service.generate_token_pair(&test_admin()).unwrap();

        assert_eq!(pair.expires_in, 259_200);
        assert_ne!(pair.access_token, pair.refresh_token);
    }
}
