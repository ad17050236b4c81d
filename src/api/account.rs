//! Authenticated account endpoints.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;

use super::error::ApiError;
use super::types::UserProfile;
use crate::http::HttpClient;

pub struct AccountApi {
    http: Arc<HttpClient>,
}

impl AccountApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Profile of the logged-in user.
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        self.http.get("/account/me").await
    }

    /// Change the current password. Goes through the authenticated
    /// transport, so an expired access token is refreshed transparently.
    pub async fn change_password(
        &self,
        old: &str,
        new: &str,
        repeat: &str,
    ) -> Result<StatusCode, ApiError> {
        #[derive(Serialize)]
        struct ChangePasswordRequest<'a> {
            old_password: &'a str,
            password: &'a str,
            password_confirmation: &'a str,
        }

        self.http
            .post_status(
                "/account/change_password",
                &ChangePasswordRequest {
                    old_password: old,
                    password: new,
                    password_confirmation: repeat,
                },
            )
            .await
    }
}
