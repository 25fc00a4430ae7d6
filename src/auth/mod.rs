use chrono::Utc;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::Tokens;

/// Claims the client cares about. The identity provider signs the token; the
/// client only reads it, the backend does the verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl Claims {
    pub fn is_expired(&self) -> bool {
        matches!(self.exp, Some(exp) if exp <= Utc::now().timestamp())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.preferred_username
            .as_deref()
            .or(self.email.as_deref())
            .or(self.sub.as_deref())
    }
}

/// Read claims without verifying the signature. `None` for opaque tokens.
pub fn peek_claims(token: &str) -> Option<Claims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}

/// A token is usable unless it is a JWT whose `exp` has passed
pub fn is_usable(token: &str) -> bool {
    match peek_claims(token) {
        Some(claims) => !claims.is_expired(),
        None => !token.trim().is_empty(),
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Password and refresh-token grants against the realm's token endpoint
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    token_endpoint: String,
    client_id: String,
}

impl IdentityClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            token_endpoint: config.token_endpoint(),
            client_id: config.identity.client_id.clone(),
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Tokens, ApiError> {
        tracing::debug!("Requesting password grant for {}", username);
        self.grant(&[
            ("grant_type", "password"),
            ("client_id", &self.client_id),
            ("username", username),
            ("password", password),
        ])
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Tokens, ApiError> {
        tracing::debug!("Requesting refresh-token grant");
        self.grant(&[
            ("grant_type", "refresh_token"),
            ("client_id", &self.client_id),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn grant(&self, form: &[(&str, &str)]) -> Result<Tokens, ApiError> {
        let response = self.http.post(&self.token_endpoint).form(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            // Bad credentials come back as 400/401 invalid_grant
            return Err(match ApiError::from_response(status.as_u16(), &body) {
                ApiError::Validation { message, .. } => ApiError::unauthorized(message),
                other => other,
            });
        }

        let token: TokenResponse = serde_json::from_slice(&body)?;
        Ok(Tokens::new(token.access_token, token.refresh_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_with_exp(exp: i64) -> String {
        let claims = Claims {
            sub: Some("user-1".into()),
            preferred_username: Some("buyer".into()),
            email: None,
            exp: Some(exp),
            iat: Some(exp - 60),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"any-secret")).unwrap()
    }

    #[test]
    fn expired_jwt_is_not_usable() {
        let token = token_with_exp(Utc::now().timestamp() - 10);
        assert!(!is_usable(&token));
    }

    #[test]
    fn live_jwt_is_usable_and_readable() {
        let token = token_with_exp(Utc::now().timestamp() + 3600);
        assert!(is_usable(&token));
        assert_eq!(peek_claims(&token).unwrap().display_name(), Some("buyer"));
    }

    #[test]
    fn opaque_tokens_are_passed_through() {
        assert!(is_usable("token-abc"));
        assert!(peek_claims("token-abc").is_none());
        assert!(!is_usable("   "));
    }
}
