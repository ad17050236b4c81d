//! Wishlist and item endpoints.
//!
//! All calls ride the authenticated transport; `shared` works without a
//! session because the backend leaves `/shared/{slug}` open.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;
use uuid::Uuid;

use super::error::ApiError;
use super::types::{ItemPatch, NewItem, SharedLink, Wishlist, WishlistItem};
use crate::http::HttpClient;

pub struct WishlistApi {
    http: Arc<HttpClient>,
}

impl WishlistApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> Result<Vec<Wishlist>, ApiError> {
        self.http.get("/wishlists").await
    }

    pub async fn get(&self, id: Uuid) -> Result<Wishlist, ApiError> {
        self.http.get(&format!("/wishlists/{}", id)).await
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Wishlist, ApiError> {
        #[derive(Serialize)]
        struct NewWishlist<'a> {
            name: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
        }

        self.http
            .post("/wishlists", &NewWishlist { name, description })
            .await
    }

    pub async fn rename(&self, id: Uuid, name: &str) -> Result<Wishlist, ApiError> {
        #[derive(Serialize)]
        struct Rename<'a> {
            name: &'a str,
        }

        self.http
            .put(&format!("/wishlists/{}", id), &Rename { name })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<StatusCode, ApiError> {
        self.http.delete(&format!("/wishlists/{}", id)).await
    }

    pub async fn add_item(&self, wishlist: Uuid, item: &NewItem) -> Result<WishlistItem, ApiError> {
        self.http
            .post(&format!("/wishlists/{}/items", wishlist), item)
            .await
    }

    pub async fn update_item(
        &self,
        wishlist: Uuid,
        item: Uuid,
        patch: &ItemPatch,
    ) -> Result<WishlistItem, ApiError> {
        self.http
            .put(&format!("/wishlists/{}/items/{}", wishlist, item), patch)
            .await
    }

    pub async fn remove_item(&self, wishlist: Uuid, item: Uuid) -> Result<StatusCode, ApiError> {
        self.http
            .delete(&format!("/wishlists/{}/items/{}", wishlist, item))
            .await
    }

    /// Reveal a password-gated item. A wrong password comes back as a
    /// non-success status from the backend.
    pub async fn unlock_item(
        &self,
        wishlist: Uuid,
        item: Uuid,
        password: &str,
    ) -> Result<WishlistItem, ApiError> {
        #[derive(Serialize)]
        struct Unlock<'a> {
            password: &'a str,
        }

        self.http
            .post(
                &format!("/wishlists/{}/items/{}/unlock", wishlist, item),
                &Unlock { password },
            )
            .await
    }

    /// Mint a read-only share link for a wishlist.
    pub async fn share(&self, id: Uuid) -> Result<SharedLink, ApiError> {
        #[derive(Serialize)]
        struct Empty {}

        self.http
            .post(&format!("/wishlists/{}/share", id), &Empty {})
            .await
    }

    /// Fetch a shared wishlist by slug. No session required.
    pub async fn shared(&self, slug: &str) -> Result<Wishlist, ApiError> {
        self.http.get(&format!("/shared/{}", slug)).await
    }
}
