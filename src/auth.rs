use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

use crate::db::operations::find_user;
use crate::db::Database;

const AUTH_COOKIE_NAME: &str = "auth_token";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    Expired,
    #[error("JWT_SECRET is not configured")]
    MissingSecret,
    #[error("invalid token lifetime")]
    InvalidExpiresIn,
    #[error("user no longer exists")]
    UnknownUser,
    #[error("database error: {0}")]
    Database(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: String,
    pub expires_at: i64,
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = get_cookie(headers, AUTH_COOKIE_NAME) {
        return Some(token);
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

fn mac_for(secret: &str) -> Result<HmacSha256, AuthError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::MissingSecret)
}

/// Issues an HS256 token carrying `userId`, `iat` and `exp`.
pub fn sign_token_for_user(
    user_id: &str,
    secret: &str,
    ttl: Duration,
) -> Result<(String, DateTime<Utc>), AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let issued_at = Utc::now();
    let expires_at = issued_at
        .checked_add_signed(ttl)
        .ok_or(AuthError::InvalidExpiresIn)?;

    let header_json = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
    let payload_json = serde_json::json!({
        "userId": user_id,
        "iat": issued_at.timestamp(),
        "exp": expires_at.timestamp(),
    });

    let header_b64 = URL_SAFE_NO_PAD.encode(header_json.to_string());
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json.to_string());
    let signing_input = format!("{header_b64}.{payload_b64}");

    let mut mac = mac_for(secret)?;
    mac.update(signing_input.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok((format!("{signing_input}.{sig_b64}"), expires_at))
}

pub fn verify_token(
    token: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<TokenClaims, AuthError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::InvalidToken);
    };

    let decode = |part: &str| {
        URL_SAFE_NO_PAD
            .decode(part.as_bytes())
            .map_err(|_| AuthError::InvalidToken)
    };

    let header_json: serde_json::Value =
        serde_json::from_slice(&decode(header_b64)?).map_err(|_| AuthError::InvalidToken)?;
    if header_json.get("alg").and_then(|value| value.as_str()) != Some("HS256") {
        return Err(AuthError::InvalidToken);
    }

    let mut mac = mac_for(secret)?;
    mac.update(format!("{header_b64}.{payload_b64}").as_bytes());
    mac.verify_slice(&decode(sig_b64)?)
        .map_err(|_| AuthError::InvalidToken)?;

    let payload: serde_json::Value =
        serde_json::from_slice(&decode(payload_b64)?).map_err(|_| AuthError::InvalidToken)?;

    let expires_at = payload
        .get("exp")
        .and_then(|value| value.as_i64())
        .ok_or(AuthError::InvalidToken)?;
    if now.timestamp() >= expires_at {
        return Err(AuthError::Expired);
    }

    let user_id = payload
        .get("userId")
        .and_then(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::InvalidToken)?
        .to_string();

    Ok(TokenClaims {
        user_id,
        expires_at,
    })
}

/// Verifies the token and resolves it to a live user record.
pub async fn authenticate(db: &Database, secret: &str, token: &str) -> Result<AuthUser, AuthError> {
    let claims = verify_token(token, secret, Utc::now())?;

    let user = find_user(db, &claims.user_id)
        .await
        .map_err(|err| AuthError::Database(err.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    Ok(AuthUser {
        id: user.id,
        name: user.name,
        email: user.email,
    })
}

pub fn parse_expires_in(value: &str) -> Result<Duration, AuthError> {
    let trimmed = value.trim();
    if trimmed.len() < 2 || !trimmed.is_ascii() {
        return Err(AuthError::InvalidExpiresIn);
    }

    let (digits, unit) = trimmed.split_at(trimmed.len() - 1);
    let amount: i64 = digits.parse().map_err(|_| AuthError::InvalidExpiresIn)?;
    if amount <= 0 {
        return Err(AuthError::InvalidExpiresIn);
    }

    match unit {
        "s" => Ok(Duration::seconds(amount)),
        "m" => Ok(Duration::minutes(amount)),
        "h" => Ok(Duration::hours(amount)),
        "d" => Ok(Duration::days(amount)),
        _ => Err(AuthError::InvalidExpiresIn),
    }
}

fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_sign_then_verify() {
        let (token, expires_at) =
            sign_token_for_user("user-1", SECRET, Duration::hours(1)).unwrap();
        let claims = verify_token(&token, SECRET, Utc::now()).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.expires_at, expires_at.timestamp());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (token, _) = sign_token_for_user("user-1", SECRET, Duration::hours(1)).unwrap();
        assert!(matches!(
            verify_token(&token, "other", Utc::now()),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let (token, _) = sign_token_for_user("user-1", SECRET, Duration::seconds(30)).unwrap();
        let later = Utc::now() + Duration::minutes(5);
        assert!(matches!(verify_token(&token, SECRET, later), Err(AuthError::Expired)));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let (token, _) = sign_token_for_user("user-1", SECRET, Duration::hours(1)).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(r#"{"userId":"admin","exp":9999999999}"#);
        parts[1] = &forged;
        assert!(verify_token(&parts.join("."), SECRET, Utc::now()).is_err());
    }

    #[test]
    fn test_unsigned_blob_rejected() {
        let blob = URL_SAFE_NO_PAD.encode(r#"{"userId":"user-1"}"#);
        assert!(verify_token(&blob, SECRET, Utc::now()).is_err());
    }

    #[test]
    fn test_extract_token_prefers_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; auth_token=from-cookie"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_parse_expires_in() {
        assert_eq!(parse_expires_in("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_expires_in("24h").unwrap(), Duration::hours(24));
        assert!(parse_expires_in("0m").is_err());
        assert!(parse_expires_in("h").is_err());
        assert!(parse_expires_in("10w").is_err());
    }
}
