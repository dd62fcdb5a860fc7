//! Storage of request tokens across the authorization redirect.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::error::StorageMiss;
use super::token::RequestToken;

/// Persists request tokens between the authorization redirect and the
/// access token exchange.
///
/// Implementations must be scoped to one end-user session (an HTTP session
/// or equivalent), so that concurrent flows of different users never see
/// each other's tokens. One request token is kept per resource owner: a new
/// flow replaces the token of an abandoned one.
pub trait RequestTokenStorage: Send + Sync {
    /// Saves the request token of a resource owner, replacing any previous
    /// token of that owner.
    fn save(&self, owner: &str, token: RequestToken) -> impl Future<Output = ()> + Send;

    /// Fetches and removes the request token of a resource owner.
    ///
    /// `token` is the one received in the callback. The stored token is
    /// returned even if it differs, so that the caller can reject the
    /// mismatch; either way the flow cannot be resumed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageMiss`] if no token is stored for this owner.
    fn fetch(
        &self,
        owner: &str,
        token: &str,
    ) -> impl Future<Output = Result<RequestToken, StorageMiss>> + Send;
}

type Bucket = HashMap<String, RequestToken>;

/// In-memory request token storage with one isolated bucket per session.
///
/// ```rust
/// use oauth1_owner::{InMemoryTokenStorage, RequestToken, RequestTokenStorage};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let storage = InMemoryTokenStorage::new();
/// let alice = storage.session("alice");
/// let bob = storage.session("bob");
///
/// alice.save("twitter", RequestToken::new("token", "secret")).await;
///
/// assert!(bob.fetch("twitter", "token").await.is_err());
/// assert!(alice.fetch("twitter", "token").await.is_ok());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenStorage {
    sessions: Arc<RwLock<HashMap<String, Bucket>>>,
}

impl InMemoryTokenStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the storage of one session.
    pub fn session(&self, id: impl Into<String>) -> SessionTokenStorage {
        SessionTokenStorage {
            session: id.into(),
            sessions: Arc::clone(&self.sessions),
        }
    }

    /// Drops every token of a session.
    pub async fn clear_session(&self, id: &str) {
        let mut guard = self.sessions.write().await;
        guard.remove(id);
    }

    /// Returns the number of sessions holding at least one token.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Request token storage bound to one session of an [`InMemoryTokenStorage`].
#[derive(Debug, Clone)]
pub struct SessionTokenStorage {
    session: String,
    sessions: Arc<RwLock<HashMap<String, Bucket>>>,
}

impl SessionTokenStorage {
    /// Returns the session identifier.
    pub fn session(&self) -> &str {
        &self.session
    }
}

impl RequestTokenStorage for SessionTokenStorage {
    async fn save(&self, owner: &str, token: RequestToken) {
        let mut guard = self.sessions.write().await;
        guard
            .entry(self.session.clone())
            .or_default()
            .insert(owner.to_string(), token);
    }

    async fn fetch(&self, owner: &str, token: &str) -> Result<RequestToken, StorageMiss> {
        let mut guard = self.sessions.write().await;
        let Some(bucket) = guard.get_mut(&self.session) else {
            return Err(StorageMiss {
                owner: owner.to_string(),
                token: token.to_string(),
            });
        };

        let stored = bucket.remove(owner);
        if bucket.is_empty() {
            guard.remove(&self.session);
        }

        stored.ok_or_else(|| StorageMiss {
            owner: owner.to_string(),
            token: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_fetch_saved_token() {
        let storage = InMemoryTokenStorage::new().session("session");
        storage.save("oauth1", RequestToken::new("token", "secret")).await;

        let token = storage.fetch("oauth1", "token").await.expect("Should fetch");
        assert_eq!(token, RequestToken::new("token", "secret"));
    }

    #[tokio::test]
    async fn should_consume_token_on_fetch() {
        let storage = InMemoryTokenStorage::new().session("session");
        storage.save("oauth1", RequestToken::new("token", "secret")).await;

        assert!(storage.fetch("oauth1", "token").await.is_ok());
        assert_eq!(
            storage.fetch("oauth1", "token").await,
            Err(StorageMiss {
                owner: "oauth1".to_string(),
                token: "token".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn should_overwrite_previous_value() {
        let storage = InMemoryTokenStorage::new().session("session");
        storage.save("oauth1", RequestToken::new("token", "first")).await;
        storage.save("oauth1", RequestToken::new("token", "second")).await;

        let token = storage.fetch("oauth1", "token").await.expect("Should fetch");
        assert!(token.secret().equals_str("second"));
    }

    #[tokio::test]
    async fn should_overwrite_previous_token_for_owner() {
        let storage = InMemoryTokenStorage::new();
        let session = storage.session("session");
        session.save("oauth1", RequestToken::new("t1", "s1")).await;
        session.save("oauth1", RequestToken::new("t2", "s2")).await;
        session.save("oauth1", RequestToken::new("t3", "s3")).await;

        let token = session.fetch("oauth1", "t1").await.expect("Should fetch");
        assert_eq!(token, RequestToken::new("t3", "s3"));

        assert!(session.fetch("oauth1", "t2").await.is_err());
        assert!(session.fetch("oauth1", "t3").await.is_err());
    }

    #[tokio::test]
    async fn should_drop_emptied_session() {
        let storage = InMemoryTokenStorage::new();
        let session = storage.session("session");
        session.save("oauth1", RequestToken::new("token", "secret")).await;
        session.save("twitter", RequestToken::new("token", "secret")).await;

        assert!(session.fetch("oauth1", "token").await.is_ok());
        assert_eq!(storage.session_count().await, 1);

        assert!(session.fetch("twitter", "token").await.is_ok());
        assert_eq!(storage.session_count().await, 0);
    }

    #[tokio::test]
    async fn should_key_tokens_by_owner_name() {
        let storage = InMemoryTokenStorage::new().session("session");
        storage.save("oauth1", RequestToken::new("token", "secret")).await;

        assert!(storage.fetch("foo", "token").await.is_err());
        assert!(storage.fetch("oauth1", "token").await.is_ok());
    }

    #[tokio::test]
    async fn should_isolate_sessions() {
        let storage = InMemoryTokenStorage::new();
        let alice = storage.session("alice");
        let bob = storage.session("bob");

        alice.save("oauth1", RequestToken::new("token", "alice-secret")).await;
        bob.save("oauth1", RequestToken::new("token", "bob-secret")).await;
        assert_eq!(storage.session_count().await, 2);

        let token = alice.fetch("oauth1", "token").await.expect("Should fetch");
        assert!(token.secret().equals_str("alice-secret"));

        storage.clear_session("bob").await;
        assert!(bob.fetch("oauth1", "token").await.is_err());
        assert_eq!(storage.session_count().await, 0);
    }
}
