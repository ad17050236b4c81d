//! Account and token lifecycle endpoints.
//!
//! Everything here talks to the backend over a plain client, without the
//! refresh interceptor: these are the calls that mint, rotate, or discard
//! the tokens the interceptor relies on. Transport failures are caught
//! and translated; callers see a status code or an [`ApiError`], never a
//! raw `reqwest::Error`.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use super::error::{ApiError, FieldErrors};
use super::types::{RefreshedToken, TokenPair};
use crate::config::ClientConfig;
use crate::jwt;
use crate::token_store::TokenStore;

pub struct AuthApi {
    http: reqwest::Client,
    backend_url: Url,
    frontend_url: Url,
    store: Arc<dyn TokenStore>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl AuthApi {
    pub fn new(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            backend_url: config.backend_url.clone(),
            frontend_url: config.frontend_url.clone(),
            store,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        crate::http::join_endpoint(&self.backend_url, path)
    }

    /// Log in with email and password.
    ///
    /// A blank email or password short-circuits to 401 without touching
    /// the network. On success both issued tokens are persisted through
    /// the token store and the HTTP status is returned; every failure
    /// path collapses to 401.
    pub async fn login(&self, email: &str, password: &str) -> StatusCode {
        if email.is_empty() || password.is_empty() {
            return StatusCode::UNAUTHORIZED;
        }

        match self.try_login(email, password).await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Login failed");
                StatusCode::UNAUTHORIZED
            }
        }
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<StatusCode, ApiError> {
        let url = self.endpoint("/account/login")?;
        let response = self
            .http
            .post(url)
            .json(&Credentials { email, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = %status, "Credentials rejected");
            return Ok(StatusCode::UNAUTHORIZED);
        }

        let pair: TokenPair = response.json().await?;
        self.store.save_access_token(&pair.access);
        self.store.save_refresh_token(&pair.refresh);
        Ok(status)
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Returns the new token after persisting it, or `None` on any
    /// failure (missing refresh token included). Never errors; the
    /// interceptor treats `None` as "give up and surface the 401".
    pub async fn refresh_access_token(&self) -> Option<String> {
        let refresh = self.store.refresh_token()?;

        match self.try_refresh(&refresh).await {
            Ok(access) => {
                self.store.save_access_token(&access);
                Some(access)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                None
            }
        }
    }

    async fn try_refresh(&self, refresh: &str) -> Result<String, ApiError> {
        #[derive(Serialize)]
        struct RefreshRequest<'a> {
            refresh: &'a str,
        }

        let url = self.endpoint("/account/login/refresh")?;
        let response = self
            .http
            .post(url)
            .json(&RefreshRequest { refresh })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Unauthorized);
        }

        let body: RefreshedToken = response.json().await?;
        Ok(body.access)
    }

    /// Register a new account. Server-side field errors come back as
    /// [`ApiError::Validation`] keyed by field name.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<StatusCode, ApiError> {
        let url = self.endpoint("/account/register")?;
        let response = self
            .http
            .post(url)
            .json(&Credentials { email, password })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(status);
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            if let Ok(fields) = serde_json::from_str::<FieldErrors>(&body) {
                if !fields.is_empty() {
                    return Err(ApiError::Validation(fields));
                }
            }
        }
        Err(ApiError::Status(status, body))
    }

    /// Discard the stored tokens. No network call: the backend's refresh
    /// token record simply goes unused.
    pub fn logout(&self) {
        self.store.clear();
    }

    /// Ask the backend to email a password-reset link pointing at the
    /// configured frontend.
    pub async fn request_password_reset(&self, email: &str) -> Result<StatusCode, ApiError> {
        #[derive(Serialize)]
        struct ResetRequest<'a> {
            email: &'a str,
            url: &'a str,
        }

        self.post_status(
            "/account/password_reset",
            &ResetRequest {
                email,
                url: self.frontend_url.as_str(),
            },
        )
        .await
    }

    /// Complete a password reset with the token from the reset email.
    pub async fn reset_password(
        &self,
        password: &str,
        repeat: &str,
        token: &str,
    ) -> Result<StatusCode, ApiError> {
        #[derive(Serialize)]
        struct ConfirmRequest<'a> {
            password: &'a str,
            token: &'a str,
            password_confirmation: &'a str,
        }

        self.post_status(
            "/account/password_reset/confirm",
            &ConfirmRequest {
                password,
                token,
                password_confirmation: repeat,
            },
        )
        .await
    }

    /// Ask the backend to send a verification email.
    pub async fn verify_email(&self, user_id: Uuid) -> Result<StatusCode, ApiError> {
        #[derive(Serialize)]
        struct VerifyRequest {
            user_id: Uuid,
        }

        self.post_status("/account/verify_email", &VerifyRequest { user_id })
            .await
    }

    /// Confirm an email address with the token from the verification email.
    pub async fn confirm_email(&self, token: &str) -> Result<StatusCode, ApiError> {
        #[derive(Serialize)]
        struct ConfirmRequest<'a> {
            token: &'a str,
        }

        self.post_status("/account/confirm", &ConfirmRequest { token })
            .await
    }

    /// Whether the stored access token is present, decodable, and unexpired.
    pub fn is_token_valid(&self) -> bool {
        jwt::is_valid(self.store.access_token().as_deref())
    }

    async fn post_status<B: Serialize>(&self, path: &str, body: &B) -> Result<StatusCode, ApiError> {
        let url = self.endpoint(path)?;
        let response = self.http.post(url).json(body).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(status);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        Err(ApiError::Status(
            status,
            response.text().await.unwrap_or_default(),
        ))
    }
}
