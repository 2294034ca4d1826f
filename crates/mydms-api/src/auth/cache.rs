//! Process-wide cache of decoded tokens

use super::models::User;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEFAULT_CAPACITY: usize = 1000;

struct CachedUser {
    user: User,
    stored: Instant,
}

/// Maps a raw token to the user it was decoded to, for at most `ttl`
pub struct TokenCache {
    entries: Mutex<LruCache<String, CachedUser>>,
    ttl: Duration,
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub async fn get(&self, token: &str) -> Option<User> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(token) {
            Some(entry) if entry.stored.elapsed() < self.ttl => return Some(entry.user.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(token);
        }
        None
    }

    pub async fn put(&self, token: String, user: User) {
        let mut entries = self.entries.lock().await;
        entries.put(
            token,
            CachedUser {
                user,
                stored: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User {
            username: name.to_string(),
            roles: vec!["user".to_string()],
            email: format!("{}@example.com", name),
            user_id: "1".to_string(),
            display_name: name.to_string(),
            authenticated: true,
        }
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = TokenCache::new(Duration::from_secs(600));
        cache.put("token".to_string(), user("alice")).await;
        assert_eq!(cache.get("token").await, Some(user("alice")));
        assert_eq!(cache.get("other").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_dropped() {
        let cache = TokenCache::new(Duration::ZERO);
        cache.put("token".to_string(), user("alice")).await;
        assert_eq!(cache.get("token").await, None);
        assert!(cache.entries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_least_recently_used_is_evicted() {
        let cache = TokenCache::with_capacity(Duration::from_secs(600), 1);
        cache.put("a".to_string(), user("alice")).await;
        cache.put("b".to_string(), user("bob")).await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some(user("bob")));
    }
}
