use crate::language::{detect_language, Language};
use crate::translation::cache::TranslationCache;
use crate::translation::long_text::TextChunker;
use crate::translation::provider::{
    build_provider, http_client, ProviderKind, ProviderStrategy, TranslationProvider,
};
use crate::utils::{AppConfig, RefineryError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Provider chain with per-provider retries, exponential backoff, chunking and caching.
///
/// Translation never fails outright: when every provider is exhausted the input text is
/// returned unchanged so a long job keeps going.
#[derive(Clone)]
pub struct RobustTranslator {
    providers: Vec<Arc<dyn TranslationProvider>>,
    cache: TranslationCache,
    chunker: TextChunker,
    retries: usize,
    backoff_base: Duration,
    chunk_delay: Duration,
    source_lang: String,
}

impl RobustTranslator {
    pub fn new(providers: Vec<Arc<dyn TranslationProvider>>) -> Self {
        Self {
            providers,
            cache: TranslationCache::default(),
            chunker: TextChunker::default(),
            retries: 3,
            backoff_base: Duration::from_millis(600),
            chunk_delay: Duration::from_millis(150),
            source_lang: "auto".to_string(),
        }
    }

    /// Provider chain of a named strategy, or `translation.provider_order` when none is given.
    pub fn from_config(config: &AppConfig, strategy: Option<ProviderStrategy>) -> Result<Self> {
        let kinds: Vec<ProviderKind> = match strategy {
            Some(strategy) => strategy.provider_order(),
            None => config
                .translation
                .provider_order
                .iter()
                .map(|name| name.parse())
                .collect::<Result<_>>()?,
        };
        if kinds.is_empty() {
            return Err(RefineryError::ConfigError(
                "translation.provider_order is empty".to_string(),
            ));
        }

        let client = http_client(&config.api)?;
        let api_key = config.llm_api_key();
        let providers = kinds
            .into_iter()
            .map(|kind| build_provider(kind, &config.api, client.clone(), api_key.clone()))
            .collect::<Result<Vec<_>>>()?;

        let t = &config.translation;
        Ok(Self::new(providers)
            .with_retries(t.retries)
            .with_backoff(Duration::from_millis(t.backoff_base_ms))
            .with_chunk_delay(Duration::from_millis(t.chunk_delay_ms))
            .with_chunker(TextChunker::new(t.chunk_max_chars))
            .with_cache(TranslationCache::new(t.cache_size)))
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries.max(1);
        self
    }

    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn with_chunker(mut self, chunker: TextChunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub async fn translate_robust(&self, text: &str, target: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        for provider in &self.providers {
            for attempt in 0..self.retries {
                match self.translate_chunks(provider.as_ref(), text, target).await {
                    Ok(translated) => return translated,
                    Err(e) => {
                        warn!(
                            provider = provider.name(),
                            attempt = attempt,
                            error = %e,
                            "Translation attempt failed"
                        );
                        let backoff = self.backoff_base * 2u32.pow(attempt as u32);
                        if !backoff.is_zero() {
                            tokio::time::sleep(backoff).await;
                        }
                    }
                }
            }
        }

        warn!(
            providers = ?self.provider_names(),
            chars = text.chars().count(),
            "All providers failed, keeping original text"
        );
        text.to_string()
    }

    /// Only Dari/Pashto text goes to a provider; everything else comes back trimmed.
    pub async fn translate_text(&self, text: &str, target: &str) -> String {
        let s = text.trim();
        match detect_language(s) {
            Language::Empty => String::new(),
            Language::DariPashto => self.translate_robust(s, target).await,
            Language::English | Language::Unknown => s.to_string(),
        }
    }

    async fn translate_chunks(
        &self,
        provider: &dyn TranslationProvider,
        text: &str,
        target: &str,
    ) -> Result<String> {
        let chunks = self.chunker.chunk(text);
        let mut translated = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            if let Some(hit) = self.cache.get(provider.name(), target, chunk).await {
                translated.push(hit);
                continue;
            }

            if !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
            let result = provider.translate(chunk, &self.source_lang, target).await?;
            self.cache
                .insert(provider.name(), target, chunk, result.clone())
                .await;
            translated.push(result);
        }

        debug!(provider = provider.name(), chunks = chunks.len(), "Text translated");
        Ok(self.chunker.merge(translated))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::translation::provider::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Prefixes every chunk with its own name so tests can see which provider answered.
    pub struct EchoProvider {
        pub name: &'static str,
        pub calls: AtomicUsize,
    }

    impl EchoProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TranslationProvider for EchoProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn translate<'a>(
            &'a self,
            text: &'a str,
            _source: &'a str,
            _target: &'a str,
        ) -> BoxFuture<'a, Result<String>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(format!("[{}]{}", self.name, text))
            })
        }
    }

    pub struct FailingProvider {
        pub calls: AtomicUsize,
    }

    impl TranslationProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn translate<'a>(
            &'a self,
            _text: &'a str,
            _source: &'a str,
            _target: &'a str,
        ) -> BoxFuture<'a, Result<String>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Err(RefineryError::ApiError("quota exceeded".to_string()))
            })
        }
    }

    fn instant(providers: Vec<Arc<dyn TranslationProvider>>) -> RobustTranslator {
        RobustTranslator::new(providers)
            .with_backoff(Duration::ZERO)
            .with_chunk_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn falls_back_after_retries() {
        let failing = Arc::new(FailingProvider {
            calls: AtomicUsize::new(0),
        });
        let echo = Arc::new(EchoProvider::new("backup"));
        let translator = instant(vec![failing.clone(), echo.clone()]);

        let out = translator.translate_robust("سلام", "en").await;
        assert_eq!(out, "[backup]سلام");
        assert_eq!(failing.calls.load(Ordering::SeqCst), 3);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn total_failure_keeps_original() {
        let failing = Arc::new(FailingProvider {
            calls: AtomicUsize::new(0),
        });
        let translator = instant(vec![failing.clone()]).with_retries(2);

        assert_eq!(translator.translate_robust("آب نیست", "en").await, "آب نیست");
        assert_eq!(failing.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn long_text_is_chunked_and_joined() {
        let echo = Arc::new(EchoProvider::new("p"));
        let translator = instant(vec![echo.clone()]).with_chunker(TextChunker::new(5));

        let out = translator.translate_robust("abcd\nefgh", "en").await;
        assert_eq!(out, "[p]abcd\n[p]efgh");
        assert_eq!(echo.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn repeated_text_hits_the_cache() {
        let echo = Arc::new(EchoProvider::new("p"));
        let translator = instant(vec![echo.clone()]);

        translator.translate_robust("کابل", "en").await;
        translator.translate_robust("کابل", "en").await;
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(translator.cache().len().await, 1);
    }

    #[tokio::test]
    async fn only_dari_pashto_is_sent() {
        let echo = Arc::new(EchoProvider::new("p"));
        let translator = instant(vec![echo.clone()]);

        assert_eq!(translator.translate_text("   ", "en").await, "");
        assert_eq!(translator.translate_text(" Kabul ", "en").await, "Kabul");
        assert_eq!(translator.translate_text(" 123 ", "en").await, "123");
        assert_eq!(translator.translate_text(" هرات ", "en").await, "[p]هرات");
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn strategy_or_configured_order_builds_chain() {
        let named = RobustTranslator::from_config(
            &AppConfig::default(),
            Some(ProviderStrategy::MyMemoryOnly),
        )
        .unwrap();
        assert_eq!(named.provider_names(), vec!["mymemory"]);

        let mut config = AppConfig::default();
        config.translation.provider_order = vec!["mymemory".into(), "google".into()];
        let ordered = RobustTranslator::from_config(&config, None).unwrap();
        assert_eq!(ordered.provider_names(), vec!["mymemory", "google"]);

        config.translation.provider_order.clear();
        assert!(RobustTranslator::from_config(&config, None).is_err());

        config.translation.provider_order = vec!["deepl".into()];
        assert!(RobustTranslator::from_config(&config, None).is_err());
    }
}
