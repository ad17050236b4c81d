//! Typed client for the wishlist backend: token storage, JWT payload
//! inspection, an authenticated transport with silent refresh-and-retry,
//! and the account/wishlist API surfaces riding it.

pub mod api;
pub mod cli;
pub mod config;
pub mod http;
pub mod jwt;
pub mod token_store;

use std::sync::Arc;

use api::{AccountApi, AuthApi, WishlistApi, error::ApiError};
use config::ClientConfig;
use http::HttpClient;
use token_store::TokenStore;

/// Handle bundling the API surfaces that share one transport and one
/// token store. Cheap to clone pieces out of; every surface behind it
/// talks to the same backend with the same credentials.
pub struct Wishkeeper {
    /// Account and token lifecycle calls (unauthenticated transport).
    pub auth: Arc<AuthApi>,
    /// Authenticated account endpoints.
    pub account: AccountApi,
    /// Wishlist and item endpoints.
    pub wishlists: WishlistApi,
}

/// Build a client against the given backend.
///
/// The configuration is passed in explicitly; there is no process-global
/// client or config, so tests can run any number of independent clients
/// against different backends.
pub fn create_client(
    config: &ClientConfig,
    store: Arc<dyn TokenStore>,
) -> Result<Wishkeeper, ApiError> {
    let auth = Arc::new(AuthApi::new(config, store.clone())?);
    let http = Arc::new(HttpClient::new(config, store, auth.clone())?);

    Ok(Wishkeeper {
        auth,
        account: AccountApi::new(http.clone()),
        wishlists: WishlistApi::new(http),
    })
}
