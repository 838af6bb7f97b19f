use crate::config::app_config::TokenConfig;
use crate::dto::token_dto::{AccessClaimsDto, RefreshClaimsDto, TokenPairDto, TokenReadDto};
use crate::entity::user::User;
use crate::error::token_error::TokenError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const ISSUER: &str = "vidhub";
const AUDIENCE: &str = "vidhub-users";
const MIN_SECRET_BYTES: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone)]
pub struct TokenService {
    access_secret: String,
    access_ttl_minutes: i64,
    refresh_secret: String,
    refresh_ttl_days: i64,
}

pub trait TokenServiceTrait {
    fn new(config: &TokenConfig) -> Result<Self, TokenError> where Self: Sized;
    fn generate_access_token(&self, user: &User) -> Result<TokenReadDto, TokenError>;
    fn generate_refresh_token(&self, user_id: Uuid) -> Result<TokenReadDto, TokenError>;
    fn generate_token_pair(&self, user: &User) -> Result<TokenPairDto, TokenError>;
    fn verify_access_token(&self, token: &str) -> Result<AccessClaimsDto, TokenError>;
    fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaimsDto, TokenError>;
    /// Verify either kind and return the user id it is bound to
    fn verify(&self, token: &str, kind: TokenKind) -> Result<Uuid, TokenError>;
    fn hash_refresh_token(&self, token: &str) -> String;
}

impl TokenService {
    fn secret(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation
    }

    fn sign<T: Serialize>(&self, claims: &T, kind: TokenKind) -> Result<String, TokenError> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret(kind).as_bytes()),
        )
        .map_err(|e| TokenError::TokenCreationError(e.to_string()))
    }

    fn decode_claims<T: DeserializeOwned>(&self, token: &str, kind: TokenKind) -> Result<T, TokenError> {
        decode::<T>(
            token,
            &DecodingKey::from_secret(self.secret(kind).as_bytes()),
            &Self::validation(),
        )
        .map(|data| data.claims)
        .map_err(|err| match (err.kind(), kind) {
            (ErrorKind::ExpiredSignature, TokenKind::Access) => TokenError::TokenExpired,
            (ErrorKind::ExpiredSignature, TokenKind::Refresh) => TokenError::RefreshTokenExpired,
            (_, TokenKind::Access) => TokenError::InvalidToken,
            (_, TokenKind::Refresh) => TokenError::InvalidRefreshToken,
        })
    }

    fn window(ttl: Option<chrono::TimeDelta>) -> Result<(i64, i64), TokenError> {
        let now = chrono::Utc::now();
        let exp = ttl
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| TokenError::TokenCreationError(
                "Token expiration calculation overflow".to_string()
            ))?
            .timestamp();
        Ok((now.timestamp(), exp))
    }
}

impl TokenServiceTrait for TokenService {
    fn new(config: &TokenConfig) -> Result<Self, TokenError> {
        // HS256 needs at least 256 bits of key material
        for (name, secret) in [
            ("ACCESS_TOKEN_SECRET", &config.access_secret),
            ("REFRESH_TOKEN_SECRET", &config.refresh_secret),
        ] {
            if secret.len() < MIN_SECRET_BYTES {
                return Err(TokenError::TokenCreationError(format!(
                    "{} must be at least {} bytes. Current length: {}",
                    name,
                    MIN_SECRET_BYTES,
                    secret.len()
                )));
            }
        }

        config
            .check_ttls()
            .map_err(|e| TokenError::TokenCreationError(e.to_string()))?;

        if config.access_secret == config.refresh_secret {
            return Err(TokenError::TokenCreationError(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ".to_string()
            ));
        }

        Ok(Self {
            access_secret: config.access_secret.clone(),
            access_ttl_minutes: config.access_ttl_minutes,
            refresh_secret: config.refresh_secret.clone(),
            refresh_ttl_days: config.refresh_ttl_days,
        })
    }

    fn generate_access_token(&self, user: &User) -> Result<TokenReadDto, TokenError> {
        let (iat, exp) = Self::window(chrono::TimeDelta::try_minutes(self.access_ttl_minutes))?;

        let claims = AccessClaimsDto {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            fullname: user.fullname.clone(),
            iat,
            exp,
            jti: Uuid::now_v7().to_string(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
        };

        let token = self.sign(&claims, TokenKind::Access)?;
        Ok(TokenReadDto { token, iat, exp })
    }

    fn generate_refresh_token(&self, user_id: Uuid) -> Result<TokenReadDto, TokenError> {
        let (iat, exp) = Self::window(chrono::TimeDelta::try_days(self.refresh_ttl_days))?;

        let claims = RefreshClaimsDto {
            sub: user_id,
            iat,
            exp,
            jti: Uuid::now_v7().to_string(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
        };

        let token = self.sign(&claims, TokenKind::Refresh)?;
        Ok(TokenReadDto { token, iat, exp })
    }

    fn generate_token_pair(&self, user: &User) -> Result<TokenPairDto, TokenError> {
        let access = self.generate_access_token(user)?;
        let refresh = self.generate_refresh_token(user.id)?;

        Ok(TokenPairDto {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    fn verify_access_token(&self, token: &str) -> Result<AccessClaimsDto, TokenError> {
        self.decode_claims(token, TokenKind::Access)
    }

    fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaimsDto, TokenError> {
        self.decode_claims(token, TokenKind::Refresh)
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Result<Uuid, TokenError> {
        match kind {
            TokenKind::Access => self.verify_access_token(token).map(|claims| claims.sub),
            TokenKind::Refresh => self.verify_refresh_token(token).map(|claims| claims.sub),
        }
    }

    fn hash_refresh_token(&self, token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    pub(crate) fn test_token_config() -> TokenConfig {
        TokenConfig {
            access_secret: "access-secret-for-tests-0123456789abcdef".to_string(),
            access_ttl_minutes: 15,
            refresh_secret: "refresh-secret-for-tests-0123456789abcdef".to_string(),
            refresh_ttl_days: 10,
        }
    }

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::now_v7(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            fullname: "Alice".to_string(),
            password: "hash".to_string(),
            avatar: "https://cdn/avatar.png".to_string(),
            cover_image: None,
            refresh_token_hash: None,
            watch_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_rejects_short_secret() {
        let mut config = test_token_config();
        config.access_secret = "short".to_string();

        assert!(matches!(TokenService::new(&config), Err(TokenError::TokenCreationError(_))));
    }

    #[test]
    fn test_rejects_out_of_range_ttl() {
        let mut config = test_token_config();
        config.access_ttl_minutes = i64::MAX;
        assert!(matches!(TokenService::new(&config), Err(TokenError::TokenCreationError(_))));

        let mut config = test_token_config();
        config.refresh_ttl_days = 0;
        assert!(matches!(TokenService::new(&config), Err(TokenError::TokenCreationError(_))));
    }

    #[test]
    fn test_rejects_shared_secret() {
        let mut config = test_token_config();
        config.refresh_secret = config.access_secret.clone();

        assert!(TokenService::new(&config).is_err());
    }

    #[test]
    fn test_access_token_round_trip_carries_identity() {
        let service = TokenService::new(&test_token_config()).unwrap();
        let user = test_user();

        let token = service.generate_access_token(&user).unwrap();
        let claims = service.verify_access_token(&token.token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(token.exp - token.iat, 15 * 60);
    }

    #[test]
    fn test_refresh_token_lifetime_is_days() {
        let service = TokenService::new(&test_token_config()).unwrap();
        let token = service.generate_refresh_token(Uuid::now_v7()).unwrap();

        assert_eq!(token.exp - token.iat, 10 * 24 * 60 * 60);
    }

    #[test]
    fn test_token_kinds_do_not_cross_verify() {
        let service = TokenService::new(&test_token_config()).unwrap();
        let pair = service.generate_token_pair(&test_user()).unwrap();

        assert!(matches!(service.verify(&pair.refresh_token, TokenKind::Access), Err(TokenError::InvalidToken)));
        assert!(matches!(
            service.verify(&pair.access_token, TokenKind::Refresh),
            Err(TokenError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn test_tampered_and_malformed_tokens_are_invalid() {
        let service = TokenService::new(&test_token_config()).unwrap();
        let token = service.generate_access_token(&test_user()).unwrap().token;
        let tampered = format!("{}x", token);

        assert!(matches!(service.verify(&tampered, TokenKind::Access), Err(TokenError::InvalidToken)));
        assert!(matches!(service.verify("not-a-jwt", TokenKind::Access), Err(TokenError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_reports_expiry() {
        let mut service = TokenService::new(&test_token_config()).unwrap();
        service.access_ttl_minutes = -5;
        service.refresh_ttl_days = -1;
        let user = test_user();

        let access = service.generate_access_token(&user).unwrap();
        let refresh = service.generate_refresh_token(user.id).unwrap();

        assert!(matches!(service.verify(&access.token, TokenKind::Access), Err(TokenError::TokenExpired)));
        assert!(matches!(
            service.verify(&refresh.token, TokenKind::Refresh),
            Err(TokenError::RefreshTokenExpired)
        ));
    }

    #[test]
    fn test_consecutive_refresh_tokens_differ() {
        let service = TokenService::new(&test_token_config()).unwrap();
        let user_id = Uuid::now_v7();

        let first = service.generate_refresh_token(user_id).unwrap();
        let second = service.generate_refresh_token(user_id).unwrap();

        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_hash_refresh_token() {
        let service = TokenService::new(&test_token_config()).unwrap();
        let hash1 = service.hash_refresh_token("token");
        let hash2 = service.hash_refresh_token("token");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, service.hash_refresh_token("other"));
    }
}
