use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenReadDto {
    pub token: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairDto {
    pub access_token: String,
    pub refresh_token: String,
}

/// Claims carried by access tokens
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessClaimsDto {
    pub sub: Uuid,
    pub email: String,
    pub username: String,
    pub fullname: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String, // keeps tokens issued in the same second distinct
    pub iss: String,
    pub aud: String,
}

/// Claims carried by refresh tokens
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshClaimsDto {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub iss: String,
    pub aud: String,
}

/// Optional body of the refresh endpoint; the cookie takes precedence
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequestDto {
    pub refresh_token: Option<String>,
}
