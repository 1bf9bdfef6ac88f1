//! Identity Toolkit REST client.

use super::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::providers::IdentityGateway;
use crate::types::{Identity, MemberId};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identity Gateway backed by Firebase Authentication.
#[derive(Clone)]
pub struct FirebaseIdentityGateway {
    client: reqwest::Client,
    config: Arc<ProviderConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseIdentityGateway {
    /// Create a gateway sharing `client`.
    #[must_use]
    pub const fn new(client: reqwest::Client, config: Arc<ProviderConfig>) -> Self {
        Self { client, config }
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> ProviderResult<T>
    where
        B: Serialize + Sync,
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.config.identity_url(method))
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<T>()
                .await
                .map_err(|e| ProviderError::Rejected(format!("unexpected response: {e}"))),
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::debug!(method, %status, "identity toolkit rejected request");
                Err(classify(status, &body))
            }
        }
    }

    fn identity(response: AuthResponse, fallback: Option<&Identity>) -> ProviderResult<Identity> {
        let id_token = response
            .id_token
            .or_else(|| fallback.map(|identity| identity.id_token.clone()))
            .ok_or_else(|| ProviderError::Rejected("response carried no id token".into()))?;
        let refresh_token = response
            .refresh_token
            .or_else(|| fallback.map(|identity| identity.refresh_token.clone()))
            .unwrap_or_default();
        let email = if response.email.is_empty() {
            fallback.map(|identity| identity.email.clone()).unwrap_or_default()
        } else {
            response.email
        };

        Ok(Identity {
            uid: MemberId::new(response.local_id),
            email,
            display_name: response.display_name.filter(|name| !name.is_empty()),
            id_token,
            refresh_token,
        })
    }
}

/// Map an Identity Toolkit error response onto a [`ProviderError`].
///
/// Error bodies look like `{"error": {"message": "WEAK_PASSWORD : Password
/// should be at least 6 characters"}}`; the code comes before ` : `.
fn classify(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_default();
    let (code, detail) = message
        .split_once(" : ")
        .map_or((message.as_str(), ""), |(code, detail)| (code, detail));

    match code {
        "EMAIL_EXISTS" => ProviderError::EmailAlreadyInUse,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED"
        | "INVALID_EMAIL" => ProviderError::InvalidCredentials,
        "WEAK_PASSWORD" => ProviderError::WeakPassword(detail.to_string()),
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
            ProviderError::Unauthenticated
        }
        _ if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            ProviderError::Unavailable(format!("{status}: {message}"))
        }
        "" => ProviderError::Rejected(status.to_string()),
        other => ProviderError::Rejected(other.to_string()),
    }
}

impl IdentityGateway for FirebaseIdentityGateway {
    async fn register(&self, email: &str, password: &str) -> ProviderResult<Identity> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: AuthResponse = self.call("accounts:signUp", &request).await?;
        Self::identity(response, None)
    }

    async fn login(&self, email: &str, password: &str) -> ProviderResult<Identity> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: AuthResponse = self.call("accounts:signInWithPassword", &request).await?;
        Self::identity(response, None)
    }

    async fn logout(&self, identity: &Identity) -> ProviderResult<()> {
        // ID tokens are stateless; dropping them client-side ends the session.
        tracing::debug!(uid = %identity.uid, "discarding identity tokens");
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> ProviderResult<()> {
        let request = OobRequest {
            request_type: "PASSWORD_RESET",
            email,
        };
        let _: serde_json::Value = self.call("accounts:sendOobCode", &request).await?;
        Ok(())
    }

    async fn update_display_name(
        &self,
        identity: &Identity,
        display_name: &str,
    ) -> ProviderResult<Identity> {
        let request = UpdateRequest {
            id_token: &identity.id_token,
            display_name,
            return_secure_token: true,
        };
        let response: AuthResponse = self.call("accounts:update", &request).await?;
        Self::identity(response, Some(identity))
    }
}
