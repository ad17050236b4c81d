//! Typed client surface for the wishlist backend.
//!
//! `auth` covers the unauthenticated account endpoints and owns the
//! token lifecycle; `account` and `wishlists` ride the authenticated
//! transport in [`crate::http`].

pub mod account;
pub mod auth;
pub mod error;
pub mod types;
pub mod wishlists;

pub use account::AccountApi;
pub use auth::AuthApi;
pub use error::{ApiError, FieldErrors};
pub use wishlists::WishlistApi;
