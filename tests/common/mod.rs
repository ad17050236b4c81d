#![allow(dead_code)]

//! In-process stub of the wishlist backend.
//!
//! Binds on a random port and mimics the account/token/wishlist
//! endpoints with counters and switches the tests poke to provoke
//! expiry, refresh failure, and stale-refresh scenarios.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use wishkeeper::api::types::{
    ItemPatch, NewItem, RefreshedToken, SharedLink, TokenPair, UserProfile, Wishlist, WishlistItem,
};
use wishkeeper::config::ClientConfig;
use wishkeeper::token_store::{MemoryTokenStore, TokenStore};
use wishkeeper::{Wishkeeper, create_client};

pub const EMAIL: &str = "user@example.com";
pub const PASSWORD: &str = "hunter2";
pub const TAKEN_EMAIL: &str = "taken@example.com";

const USER_ID: Uuid = Uuid::from_u128(0x1111_2222_3333_4444_5555_6666_7777_8888);

const STUB_SECRET: &[u8] = b"stub-secret";

#[derive(Serialize, Deserialize)]
struct StubClaims {
    sub: String,
    exp: u64,
    /// Unique per token. Expiry has seconds precision, so without this
    /// two tokens minted in the same second would be byte-identical and
    /// revoking one would revoke both.
    jti: String,
}

/// Mint a real (stub-signed) JWT so the client's payload inspection sees
/// a genuine `exp` claim.
pub fn mint_access(exp_offset_secs: i64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as i64;
    let claims = StubClaims {
        sub: USER_ID.to_string(),
        exp: (now + exp_offset_secs).max(0) as u64,
        jti: Uuid::new_v4().to_string(),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(STUB_SECRET),
    )
    .expect("Failed to mint stub token")
}

struct StoredItem {
    item: WishlistItem,
    password: Option<String>,
}

struct StoredWishlist {
    id: Uuid,
    name: String,
    description: Option<String>,
    items: Vec<StoredItem>,
}

impl StoredWishlist {
    /// Render for the wire: password-gated items come out redacted.
    fn render(&self) -> Wishlist {
        Wishlist {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            items: self.items.iter().map(render_item).collect(),
        }
    }
}

fn render_item(stored: &StoredItem) -> WishlistItem {
    if stored.password.is_some() {
        WishlistItem {
            link: None,
            protected: true,
            ..stored.item.clone()
        }
    } else {
        stored.item.clone()
    }
}

pub struct StubState {
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    /// Incremented on every /account/me attempt, authorized or not.
    pub me_calls: AtomicUsize,
    /// Refresh endpoint answers 401.
    pub fail_refresh: AtomicBool,
    /// Refresh succeeds but the minted token is pre-revoked, so the
    /// replayed request 401s again.
    pub stale_refresh: AtomicBool,
    /// Most recently issued token pair, for assertions.
    pub issued_access: Mutex<String>,
    pub issued_refresh: Mutex<String>,
    /// Access tokens the stub refuses even though their signature checks out.
    revoked: Mutex<HashSet<String>>,
    /// Authorization header of the most recent authenticated-route call.
    pub last_authorization: Mutex<Option<String>>,
    wishlists: Mutex<HashMap<Uuid, StoredWishlist>>,
    shares: Mutex<HashMap<String, Uuid>>,
}

impl StubState {
    fn new() -> Self {
        Self {
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
            fail_refresh: AtomicBool::new(false),
            stale_refresh: AtomicBool::new(false),
            issued_access: Mutex::new(String::new()),
            issued_refresh: Mutex::new(String::new()),
            revoked: Mutex::new(HashSet::new()),
            last_authorization: Mutex::new(None),
            wishlists: Mutex::new(HashMap::new()),
            shares: Mutex::new(HashMap::new()),
        }
    }

    fn lock<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
        mutex.lock().expect("stub state lock poisoned")
    }

    /// Verify the bearer token like a real backend: signature and expiry
    /// must check out and the token must not be revoked. Records whatever
    /// was sent, valid or not.
    fn authorize(&self, headers: &HeaderMap) -> Result<(), StatusCode> {
        let sent = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *Self::lock(&self.last_authorization) = sent.clone();

        let token = sent
            .as_deref()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?
            .to_string();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        jsonwebtoken::decode::<StubClaims>(
            &token,
            &DecodingKey::from_secret(STUB_SECRET),
            &validation,
        )
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

        if Self::lock(&self.revoked).contains(&token) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        Ok(())
    }

    fn revoke(&self, token: &str) {
        Self::lock(&self.revoked).insert(token.to_string());
    }
}

#[derive(Deserialize)]
struct CredentialsBody {
    email: String,
    password: String,
}

async fn login(State(state): State<Arc<StubState>>, Json(body): Json<CredentialsBody>) -> Response {
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    if body.email != EMAIL || body.password != PASSWORD {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let access = mint_access(300);
    let refresh = format!("refresh-{}", Uuid::new_v4());
    *StubState::lock(&state.issued_access) = access.clone();
    *StubState::lock(&state.issued_refresh) = refresh.clone();

    (StatusCode::OK, Json(TokenPair { access, refresh })).into_response()
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh: String,
}

async fn refresh(State(state): State<Arc<StubState>>, Json(body): Json<RefreshBody>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    if state.fail_refresh.load(Ordering::SeqCst) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if body.refresh != *StubState::lock(&state.issued_refresh) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let access = mint_access(300);
    if state.stale_refresh.load(Ordering::SeqCst) {
        state.revoke(&access);
    }
    *StubState::lock(&state.issued_access) = access.clone();

    (StatusCode::OK, Json(RefreshedToken { access })).into_response()
}

async fn me(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }

    Json(UserProfile {
        id: USER_ID,
        email: EMAIL.to_string(),
        is_verified: true,
        last_login: Some("2026-08-01T12:00:00Z".to_string()),
    })
    .into_response()
}

async fn register(Json(body): Json<CredentialsBody>) -> Response {
    if body.email == TAKEN_EMAIL {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"email": "A user with this email already exists"})),
        )
            .into_response();
    }
    if body.password.len() < 8 {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"password": "Password must be at least 8 characters"})),
        )
            .into_response();
    }

    (StatusCode::CREATED, Json(serde_json::json!({}))).into_response()
}

async fn ok_empty() -> Response {
    Json(serde_json::json!({})).into_response()
}

async fn change_password(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }
    Json(serde_json::json!({})).into_response()
}

#[derive(Deserialize)]
struct NewWishlistBody {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

async fn list_wishlists(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }
    let lists: Vec<Wishlist> = StubState::lock(&state.wishlists)
        .values()
        .map(StoredWishlist::render)
        .collect();
    Json(lists).into_response()
}

async fn create_wishlist(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<NewWishlistBody>,
) -> Response {
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }

    let stored = StoredWishlist {
        id: Uuid::new_v4(),
        name: body.name,
        description: body.description,
        items: Vec::new(),
    };
    let rendered = stored.render();
    StubState::lock(&state.wishlists).insert(stored.id, stored);

    (StatusCode::CREATED, Json(rendered)).into_response()
}

async fn get_wishlist(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }
    match StubState::lock(&state.wishlists).get(&id) {
        Some(stored) => Json(stored.render()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn rename_wishlist(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<NewWishlistBody>,
) -> Response {
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }
    let mut wishlists = StubState::lock(&state.wishlists);
    match wishlists.get_mut(&id) {
        Some(stored) => {
            stored.name = body.name;
            Json(stored.render()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_wishlist(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }
    match StubState::lock(&state.wishlists).remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn add_item(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<NewItem>,
) -> Response {
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }
    let mut wishlists = StubState::lock(&state.wishlists);
    let Some(stored) = wishlists.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let item = WishlistItem {
        id: Uuid::new_v4(),
        name: body.name,
        link: body.link,
        priority: body.priority,
        protected: false,
    };
    stored.items.push(StoredItem {
        item,
        password: body.password,
    });
    let rendered = render_item(stored.items.last().expect("just pushed"));

    (StatusCode::CREATED, Json(rendered)).into_response()
}

async fn update_item(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<ItemPatch>,
) -> Response {
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }
    let mut wishlists = StubState::lock(&state.wishlists);
    let Some(stored) = wishlists.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(entry) = stored.items.iter_mut().find(|e| e.item.id == item_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some(name) = patch.name {
        entry.item.name = name;
    }
    if let Some(link) = patch.link {
        entry.item.link = Some(link);
    }
    if let Some(priority) = patch.priority {
        entry.item.priority = priority;
    }
    Json(render_item(entry)).into_response()
}

async fn remove_item(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Response {
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }
    let mut wishlists = StubState::lock(&state.wishlists);
    let Some(stored) = wishlists.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let before = stored.items.len();
    stored.items.retain(|e| e.item.id != item_id);
    if stored.items.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Deserialize)]
struct UnlockBody {
    password: String,
}

async fn unlock_item(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UnlockBody>,
) -> Response {
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }
    let wishlists = StubState::lock(&state.wishlists);
    let Some(stored) = wishlists.get(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(entry) = stored.items.iter().find(|e| e.item.id == item_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match &entry.password {
        Some(password) if *password == body.password => {
            Json(entry.item.clone()).into_response()
        }
        Some(_) => StatusCode::FORBIDDEN.into_response(),
        None => Json(entry.item.clone()).into_response(),
    }
}

async fn share_wishlist(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(status) = state.authorize(&headers) {
        return status.into_response();
    }
    if !StubState::lock(&state.wishlists).contains_key(&id) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let slug = Uuid::new_v4().simple().to_string();
    StubState::lock(&state.shares).insert(slug.clone(), id);
    Json(SharedLink { slug }).into_response()
}

async fn shared_wishlist(
    State(state): State<Arc<StubState>>,
    Path(slug): Path<String>,
) -> Response {
    let Some(id) = StubState::lock(&state.shares).get(&slug).copied() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match StubState::lock(&state.wishlists).get(&id) {
        Some(stored) => Json(stored.render()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/account/login", post(login))
        .route("/account/login/refresh", post(refresh))
        .route("/account/register", post(register))
        .route("/account/me", get(me))
        .route("/account/password_reset", post(ok_empty))
        .route("/account/password_reset/confirm", post(ok_empty))
        .route("/account/change_password", post(change_password))
        .route("/account/verify_email", post(ok_empty))
        .route("/account/confirm", post(ok_empty))
        .route("/wishlists", get(list_wishlists).post(create_wishlist))
        .route(
            "/wishlists/{id}",
            get(get_wishlist).put(rename_wishlist).delete(delete_wishlist),
        )
        .route("/wishlists/{id}/items", post(add_item))
        .route(
            "/wishlists/{id}/items/{item_id}",
            axum::routing::put(update_item).delete(remove_item),
        )
        .route("/wishlists/{id}/items/{item_id}/unlock", post(unlock_item))
        .route("/wishlists/{id}/share", post(share_wishlist))
        .route("/shared/{slug}", get(shared_wishlist))
        .with_state(state)
}

pub struct TestContext {
    pub client: Wishkeeper,
    pub store: Arc<MemoryTokenStore>,
    pub stub: Arc<StubState>,
    pub base_url: String,
    server_handle: tokio::task::JoinHandle<()>,
}

pub async fn setup() -> TestContext {
    let stub = Arc::new(StubState::new());
    let app = router(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local address");
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    let base_url = format!("http://127.0.0.1:{}", addr.port());
    let backend = Url::parse(&base_url).expect("Invalid base URL");
    let frontend = Url::parse("http://localhost:3000").expect("Invalid frontend URL");
    let config = ClientConfig::new(backend, frontend);

    let store = Arc::new(MemoryTokenStore::new());
    let client = create_client(&config, store.clone()).expect("Failed to build client");

    TestContext {
        client,
        store,
        stub,
        base_url,
        server_handle,
    }
}

impl TestContext {
    pub async fn login(&self) -> reqwest::StatusCode {
        self.client.auth.login(EMAIL, PASSWORD).await
    }

    /// Revoke the client's stored access token server-side. The next
    /// authenticated call will 401 until a refresh mints a new one.
    pub fn expire_access(&self) {
        if let Some(token) = self.store.access_token() {
            self.stub.revoke(&token);
        }
    }

    pub fn refresh_calls(&self) -> usize {
        self.stub.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn me_calls(&self) -> usize {
        self.stub.me_calls.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.stub.login_calls.load(Ordering::SeqCst)
    }

    pub fn last_authorization(&self) -> Option<String> {
        StubState::lock(&self.stub.last_authorization).clone()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}
