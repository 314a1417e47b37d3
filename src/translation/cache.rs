use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    provider: String,
    target: String,
    text: String,
}

/// Memoizes provider responses per `(provider, target, text)` for the life of the process.
#[derive(Debug, Clone)]
pub struct TranslationCache {
    entries: Arc<RwLock<HashMap<CacheKey, String>>>,
    max_size: usize,
}

impl TranslationCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_size,
        }
    }

    pub async fn get(&self, provider: &str, target: &str, text: &str) -> Option<String> {
        let key = CacheKey {
            provider: provider.to_string(),
            target: target.to_string(),
            text: text.to_string(),
        };
        self.entries.read().await.get(&key).cloned()
    }

    pub async fn insert(&self, provider: &str, target: &str, text: &str, translated: String) {
        if self.max_size == 0 {
            return;
        }

        let mut entries = self.entries.write().await;

        if entries.len() >= self.max_size {
            if let Some(key) = entries.keys().next().cloned() {
                entries.remove(&key);
            }
        }

        entries.insert(
            CacheKey {
                provider: provider.to_string(),
                target: target.to_string(),
                text: text.to_string(),
            },
            translated,
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(10000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keys_include_provider_and_target() {
        let cache = TranslationCache::new(10);
        cache.insert("google", "en", "سلام", "hello".into()).await;

        assert_eq!(cache.get("google", "en", "سلام").await.as_deref(), Some("hello"));
        assert_eq!(cache.get("mymemory", "en", "سلام").await, None);
        assert_eq!(cache.get("google", "fr", "سلام").await, None);
    }

    #[tokio::test]
    async fn evicts_when_full() {
        let cache = TranslationCache::new(2);
        cache.insert("p", "en", "a", "A".into()).await;
        cache.insert("p", "en", "b", "B".into()).await;
        cache.insert("p", "en", "c", "C".into()).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("p", "en", "c").await.as_deref(), Some("C"));
    }

    #[tokio::test]
    async fn zero_capacity_disables_caching() {
        let cache = TranslationCache::new(0);
        cache.insert("p", "en", "a", "A".into()).await;
        assert!(cache.is_empty().await);
    }
}
