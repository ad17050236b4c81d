//! Authenticated HTTP transport with silent refresh-and-retry.
//!
//! Every authenticated call goes through [`HttpClient::execute`]: the
//! stored access token is attached as a bearer header on the way out,
//! and a 401 response triggers exactly one token refresh followed by one
//! replay of the original request. A replay that fails is returned
//! as-is; there is no second refresh and no retry loop. Concurrent
//! requests each run this sequence independently.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::api::auth::AuthApi;
use crate::api::error::ApiError;
use crate::config::ClientConfig;
use crate::token_store::TokenStore;

/// Join an endpoint path onto the backend base URL, keeping any path
/// prefix the base carries (a base of `https://host/api` plus
/// `/wishlists` yields `https://host/api/wishlists`, not
/// `https://host/wishlists`).
pub(crate) fn join_endpoint(base: &Url, path: &str) -> Result<Url, ApiError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/')).map_err(ApiError::Url)
}

pub struct HttpClient {
    inner: reqwest::Client,
    backend_url: Url,
    store: Arc<dyn TokenStore>,
    auth: Arc<AuthApi>,
}

impl HttpClient {
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn TokenStore>,
        auth: Arc<AuthApi>,
    ) -> Result<Self, ApiError> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner,
            backend_url: config.backend_url.clone(),
            store,
            auth,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        join_endpoint(&self.backend_url, path)
    }

    fn attach_bearer(request: &mut Request, token: &str) {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Stored access token is not a valid header value, sending without it"),
        }
    }

    /// Run a request through the interceptor chain.
    ///
    /// The replay copy is taken before the bearer header is attached, so
    /// a retried request carries only the freshly-minted token. Requests
    /// whose body cannot be cloned skip the retry path and surface their
    /// 401 directly.
    pub async fn execute(&self, request: Request) -> Result<Response, ApiError> {
        let replay = request.try_clone();

        let mut request = request;
        if let Some(token) = self.store.access_token() {
            Self::attach_bearer(&mut request, &token);
        }

        let response = self.inner.execute(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(mut retry) = replay else {
            return Ok(response);
        };
        let Some(token) = self.auth.refresh_access_token().await else {
            // Refresh failed: the original 401 stands, untouched.
            return Ok(response);
        };

        debug!("Access token refreshed, replaying request once");
        Self::attach_bearer(&mut retry, &token);
        Ok(self.inner.execute(retry).await?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.inner.get(self.endpoint(path)?).build()?;
        let response = Self::check(self.execute(request).await?).await?;
        Ok(response.json().await?)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.inner.post(self.endpoint(path)?).json(body).build()?;
        let response = Self::check(self.execute(request).await?).await?;
        Ok(response.json().await?)
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.inner.put(self.endpoint(path)?).json(body).build()?;
        let response = Self::check(self.execute(request).await?).await?;
        Ok(response.json().await?)
    }

    /// POST where only the resulting status matters.
    pub async fn post_status<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<StatusCode, ApiError> {
        let request = self.inner.post(self.endpoint(path)?).json(body).build()?;
        let response = Self::check(self.execute(request).await?).await?;
        Ok(response.status())
    }

    pub async fn delete(&self, path: &str) -> Result<StatusCode, ApiError> {
        let request = self.inner.delete(self.endpoint(path)?).build()?;
        let response = Self::check(self.execute(request).await?).await?;
        Ok(response.status())
    }

    /// Map a terminal response into the error taxonomy.
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
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
