//! Google OAuth token client.
//!
//! Implements [`TokenExchanger`] (authorization code → tokens) and
//! [`TokenRefresher`] (refresh token → new access token) against the token
//! endpoint with form-encoded POSTs.

use async_trait::async_trait;
use proofmint_core::{AuthorizationGrant, PipelineError, TokenExchanger, TokenRefresher, TokenSet};
use serde::Deserialize;

use crate::config::GoogleOAuthConfig;
use crate::error::OAuthClientError;

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    fn into_token_set(self) -> Result<TokenSet, OAuthClientError> {
        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(OAuthClientError::MissingAccessToken)?;

        let mut tokens = TokenSet::new(access_token);
        if let Some(token_type) = self.token_type {
            tokens.token_type = token_type;
        }
        if let Some(refresh) = self.refresh_token.filter(|t| !t.is_empty()) {
            tokens = tokens.with_refresh_token(refresh);
        }
        if let Some(seconds) = self.expires_in {
            tokens = tokens.with_expires_in(seconds);
        }
        if let Some(scope) = self.scope {
            tokens = tokens.with_scope(scope);
        }
        Ok(tokens)
    }
}

/// OAuth error response body.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for Google's OAuth token endpoint.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http_client: reqwest::Client,
    config: GoogleOAuthConfig,
}

impl GoogleOAuthClient {
    /// Creates a client with its own HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: GoogleOAuthConfig) -> Result<Self, OAuthClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_http_client(config, http_client))
    }

    /// Creates a client sharing an existing HTTP client.
    #[must_use]
    pub fn with_http_client(config: GoogleOAuthConfig, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GoogleOAuthConfig {
        &self.config
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the code, the call fails, or
    /// the response has no access token.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, OAuthClientError> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        tracing::debug!(
            endpoint = %self.config.token_endpoint,
            "Exchanging authorization code with token endpoint"
        );

        self.request_tokens(&params).await
    }

    /// Mints a new access token from a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the refresh token, the call
    /// fails, or the response has no access token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        let params = [
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        tracing::debug!(
            endpoint = %self.config.token_endpoint,
            "Refreshing access token"
        );

        self.request_tokens(&params).await
    }

    async fn request_tokens(&self, params: &[(&str, &str)]) -> Result<TokenSet, OAuthClientError> {
        let response = self
            .http_client
            .post(self.config.token_endpoint.as_str())
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if let Ok(oauth_error) = serde_json::from_str::<OAuthErrorResponse>(&body) {
                return Err(OAuthClientError::oauth(
                    oauth_error.error,
                    oauth_error.error_description.unwrap_or_default(),
                ));
            }

            return Err(OAuthClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthClientError::InvalidResponse(e.to_string()))?;

        token_response.into_token_set()
    }
}

#[async_trait]
impl TokenExchanger for GoogleOAuthClient {
    async fn exchange(&self, grant: AuthorizationGrant) -> Result<TokenSet, PipelineError> {
        let result = self.exchange_code(grant.as_str()).await;
        drop(grant);
        result.map_err(|e| {
            tracing::warn!(error = %e, "Authorization code exchange failed");
            e.into_exchange_error()
        })
    }
}

#[async_trait]
impl TokenRefresher for GoogleOAuthClient {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, PipelineError> {
        self.refresh_access_token(refresh_token).await.map_err(|e| {
            tracing::warn!(error = %e, "Access token refresh failed");
            e.into_refresh_error()
        })
    }
}

#[cfg(test)]
mod tests {
    use proofmint_core::ErrorKind;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> GoogleOAuthClient {
        let config = GoogleOAuthConfig::new("cid", "secret", "http://localhost:3000/oauth2callback")
            .with_token_endpoint(format!("{}/token", server.uri()));
        GoogleOAuthClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc123"))
            .and(body_string_contains("client_secret=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok1",
                "refresh_token": "ref1",
                "expires_in": 3599,
                "token_type": "Bearer",
                "scope": "https://www.googleapis.com/auth/youtube.readonly"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let grant = AuthorizationGrant::parse("abc123").unwrap();
        let tokens = client(&server).exchange(grant).await.unwrap();

        assert_eq!(tokens.access_token, "tok1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("ref1"));
        assert!(tokens.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_exchange_rejected_code_is_grant_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Bad Request"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let grant = AuthorizationGrant::parse("used-code").unwrap();
        let err = client(&server).exchange(grant).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Grant);
        assert!(err.to_string().starts_with("Failed to obtain access token."));
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn test_exchange_without_access_token_is_token_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token_type": "Bearer"})),
            )
            .mount(&server)
            .await;

        let grant = AuthorizationGrant::parse("abc123").unwrap();
        let err = client(&server).exchange(grant).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Token);
        assert_eq!(err.to_string(), "Failed to obtain access token.");
    }

    #[tokio::test]
    async fn test_exchange_non_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = client(&server)
            .exchange_code("abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthClientError::Http { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_refresh_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=ref1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok2",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = client(&server).refresh("ref1").await.unwrap();
        assert_eq!(tokens.access_token, "tok2");
        assert!(tokens.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_refresh_rejected_is_token_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let err = client(&server).refresh("revoked").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Token);
        assert!(err.to_string().contains("expired or revoked"));
    }
}
