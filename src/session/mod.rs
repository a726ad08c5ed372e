//! Persisted client-side session state.
//!
//! The browser keeps session state in local storage, session storage and
//! cookies. This module hides all of that behind a narrow get/set/clear
//! trait so the expiry side effect can be exercised against an in-memory
//! fake instead of a real storage backend.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Well-known storage keys written at login and read at request time.
pub mod keys {
    /// Bearer token for standard endpoints.
    pub const AUTH_TOKEN: &str = "authToken";
    /// API key for billing and admin endpoints.
    pub const API_KEY: &str = "apiKey";
    /// Serialized user profile for the signed-in account.
    pub const USER_SESSION: &str = "user-session";
    /// Whether the signed-in account has super-admin rights.
    pub const IS_SUPER_ADMIN: &str = "isSuperAdmin";
    /// Identifier of an account waiting on OTP verification.
    pub const VERIFICATION_PENDING: &str = "verification-pending";
}

/// Error type for store operations.
#[derive(Debug, Clone, Error)]
#[error("session store error: {message}")]
pub struct StoreError {
    /// Error message.
    pub message: String,
}

impl StoreError {
    /// Create a new store error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Trait for session state storage backends.
///
/// Clearing is wholesale and idempotent: concurrent expiry handlers may race
/// on `clear` and clearing an already-empty store is a no-op.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a value by key.
    async fn get(&self, key: &str) -> Option<String>;

    /// Write a value under a key.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a single key.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every persisted value.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Hook invoked when the dispatcher detects an expired session.
///
/// The portal UI implements this to navigate to the sign-in route; tests
/// implement it to record that the redirect fired.
#[async_trait]
pub trait SessionEvents: Send + Sync {
    /// Called after session state has been cleared (best effort).
    async fn on_session_expired(&self, sign_in_route: &str);
}

/// Default hook that ignores session events.
pub struct NoopEvents;

#[async_trait]
impl SessionEvents for NoopEvents {
    async fn on_session_expired(&self, _sign_in_route: &str) {}
}

/// In-memory implementation of [`SessionStore`].
///
/// Used natively and by tests; a browser build substitutes an adapter over
/// the real storage APIs.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.clear();
        Ok(())
    }
}
