//! Google service-account authentication (OAuth 2.0 JWT bearer grant).

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.file",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL_SECS: i64 = 3600;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields of a service-account key file this service uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl ServiceAccountKey {
    /// Parse key JSON. Private keys pasted into env files often carry
    /// literal `\n` sequences; those are restored to newlines.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let mut key: ServiceAccountKey = serde_json::from_str(json)
            .map_err(|e| StoreError::Credentials(format!("invalid service account JSON: {}", e)))?;
        key.private_key = key.private_key.replace("\\n", "\n");

        // Reject unusable keys up front rather than on the first request.
        EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StoreError::Credentials(format!("invalid private key: {}", e)))?;

        Ok(key)
    }

    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Inline JSON takes precedence; the key file is the fallback.
    pub fn load(inline_json: Option<&str>, file: &str) -> Result<Self, StoreError> {
        match inline_json {
            Some(json) => Self::from_json(json),
            None => Self::from_file(Path::new(file)),
        }
    }

    /// Signed assertion exchanged for an access token.
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String, StoreError> {
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: SCOPES.join(" "),
            aud: self.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_TTL_SECS)).timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(encode(&header, &claims, &key)?)
    }
}

/// Exchange a fresh assertion for an access token.
pub async fn fetch_access_token(
    client: &reqwest::Client,
    key: &ServiceAccountKey,
) -> Result<String, StoreError> {
    let assertion = key.assertion(Utc::now())?;

    let response = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Credentials(format!(
            "token exchange failed (HTTP {}): {}",
            status, body
        )));
    }

    let token: TokenResponse = response.json().await?;
    tracing::debug!(
        client_email = %key.client_email,
        expires_in = token.expires_in.unwrap_or_default(),
        "Obtained Google access token"
    );
    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

    const TEST_PRIVATE_KEY: &str = include_str!("testdata/test_service_account.pem");
    const TEST_PUBLIC_KEY: &str = include_str!("testdata/test_service_account.pub.pem");

    fn key_json(private_key: &str) -> String {
        serde_json::json!({
            "type": "service_account",
            "project_id": "ops-mood",
            "private_key_id": "abc123",
            "private_key": private_key,
            "client_email": "mood-bot@ops-mood.iam.gserviceaccount.com",
            "client_id": "1234567890",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
        })
        .to_string()
    }

    #[test]
    fn test_from_json_restores_escaped_newlines() {
        let escaped = TEST_PRIVATE_KEY.replace('\n', "\\n");
        let key = ServiceAccountKey::from_json(&key_json(&escaped)).unwrap();
        assert_eq!(key.private_key, TEST_PRIVATE_KEY);
        assert_eq!(key.client_email, "mood-bot@ops-mood.iam.gserviceaccount.com");
    }

    #[test]
    fn test_from_json_rejects_bad_key() {
        let err = ServiceAccountKey::from_json(&key_json("not a pem")).unwrap_err();
        assert!(matches!(err, StoreError::Credentials(_)));
    }

    #[test]
    fn test_from_json_rejects_malformed_json() {
        let err = ServiceAccountKey::from_json("{\"client_email\": 3").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_key_file_is_credentials_error() {
        let err = ServiceAccountKey::load(None, "/nonexistent/google_credentials.json").unwrap_err();
        assert!(matches!(err, StoreError::Credentials(_)));
    }

    #[test]
    fn test_assertion_is_signed_rs256_with_scopes() {
        let key = ServiceAccountKey::from_json(&key_json(TEST_PRIVATE_KEY)).unwrap();
        let now = Utc::now();
        let jwt = key.assertion(now).unwrap();

        let header = decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("abc123"));

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth2.googleapis.com/token"]);
        let data = decode::<AssertionClaims>(
            &jwt,
            &DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(data.claims.iss, key.client_email);
        assert_eq!(data.claims.exp - data.claims.iat, ASSERTION_TTL_SECS);
        assert!(data.claims.scope.contains("auth/spreadsheets"));
        assert!(data.claims.scope.contains("auth/drive.file"));
    }
}
