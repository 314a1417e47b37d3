use crate::translation::llm::LlmProvider;
use crate::utils::config::ApiConfig;
use crate::utils::{RefineryError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single translation backend. Implementations translate one chunk per call and
/// report failures as errors; retries and fallback live in the robust translator.
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &str;

    fn translate<'a>(
        &'a self,
        text: &'a str,
        source: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    MyMemory,
    Llm,
}

impl FromStr for ProviderKind {
    type Err = RefineryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "mymemory" | "my_memory" => Ok(ProviderKind::MyMemory),
            "llm" | "ai" => Ok(ProviderKind::Llm),
            other => Err(RefineryError::ConfigError(format!(
                "unknown translation provider: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Google => write!(f, "google"),
            ProviderKind::MyMemory => write!(f, "mymemory"),
            ProviderKind::Llm => write!(f, "llm"),
        }
    }
}

/// User-facing provider choice; each maps to an ordered fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStrategy {
    GoogleOnly,
    #[default]
    GoogleWithMyMemoryFallback,
    MyMemoryOnly,
    Llm,
}

impl ProviderStrategy {
    pub fn provider_order(&self) -> Vec<ProviderKind> {
        match self {
            ProviderStrategy::GoogleOnly => vec![ProviderKind::Google],
            ProviderStrategy::GoogleWithMyMemoryFallback => {
                vec![ProviderKind::Google, ProviderKind::MyMemory]
            }
            ProviderStrategy::MyMemoryOnly => vec![ProviderKind::MyMemory],
            ProviderStrategy::Llm => vec![ProviderKind::Llm],
        }
    }
}

impl std::fmt::Display for ProviderStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderStrategy::GoogleOnly => write!(f, "Google only"),
            ProviderStrategy::GoogleWithMyMemoryFallback => write!(f, "Google + MyMemory fallback"),
            ProviderStrategy::MyMemoryOnly => write!(f, "MyMemory only"),
            ProviderStrategy::Llm => write!(f, "LLM"),
        }
    }
}

pub fn http_client(api: &ApiConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(api.timeout_seconds))
        .build()?)
}

pub fn build_provider(
    kind: ProviderKind,
    api: &ApiConfig,
    client: Client,
    llm_api_key: Option<String>,
) -> Result<Arc<dyn TranslationProvider>> {
    let provider: Arc<dyn TranslationProvider> = match kind {
        ProviderKind::Google => Arc::new(GoogleWebProvider::new(client, &api.google_endpoint)),
        ProviderKind::MyMemory => Arc::new(MyMemoryProvider::new(
            client,
            &api.mymemory_endpoint,
            api.mymemory_email.clone(),
        )),
        ProviderKind::Llm => {
            let key = llm_api_key.ok_or_else(|| {
                RefineryError::ConfigError(format!(
                    "LLM provider selected but {} is not set",
                    api.llm_api_key_env
                ))
            })?;
            Arc::new(LlmProvider::new(client, &api.llm_endpoint, &api.llm_model, key))
        }
    };
    Ok(provider)
}

/// Free Google Translate web endpoint (`client=gtx`), no key required.
pub struct GoogleWebProvider {
    client: Client,
    endpoint: String,
}

impl GoogleWebProvider {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

impl TranslationProvider for GoogleWebProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn translate<'a>(
        &'a self,
        text: &'a str,
        source: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("client", "gtx"),
                    ("sl", source),
                    ("tl", target),
                    ("dt", "t"),
                    ("q", text),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(RefineryError::ApiError(format!(
                    "Google returned {}: {}",
                    status, body
                )));
            }

            let body: JsonValue = response.json().await?;
            parse_google_response(&body)
        })
    }
}

/// The gtx endpoint answers with nested arrays; segment `[i][0]` holds translated text.
pub fn parse_google_response(body: &JsonValue) -> Result<String> {
    let segments = body
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| RefineryError::ApiError("Unexpected Google response shape".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|t| t.as_str()))
        .collect();

    if translated.trim().is_empty() {
        return Err(RefineryError::ApiError("Google returned empty translation".to_string()));
    }
    Ok(translated)
}

/// MyMemory public API; an optional contact email raises the daily quota.
pub struct MyMemoryProvider {
    client: Client,
    endpoint: String,
    email: Option<String>,
}

impl MyMemoryProvider {
    pub fn new(client: Client, endpoint: &str, email: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    response_data: MyMemoryData,
    #[serde(rename = "responseStatus")]
    response_status: JsonValue,
    #[serde(rename = "responseDetails", default)]
    response_details: JsonValue,
}

#[derive(Debug, Deserialize)]
struct MyMemoryData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

impl TranslationProvider for MyMemoryProvider {
    fn name(&self) -> &str {
        "mymemory"
    }

    fn translate<'a>(
        &'a self,
        text: &'a str,
        source: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let source = if source == "auto" { "Autodetect" } else { source };
            let langpair = format!("{}|{}", source, target);

            let mut request = self
                .client
                .get(&self.endpoint)
                .query(&[("q", text), ("langpair", langpair.as_str())]);
            if let Some(email) = &self.email {
                request = request.query(&[("de", email.as_str())]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(RefineryError::ApiError(format!(
                    "MyMemory returned {}: {}",
                    status, body
                )));
            }

            let body: MyMemoryResponse = response.json().await?;
            parse_mymemory_response(body)
        })
    }
}

fn parse_mymemory_response(body: MyMemoryResponse) -> Result<String> {
    let status = match &body.response_status {
        JsonValue::Number(n) => n.as_u64().unwrap_or(0),
        JsonValue::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    };
    if status != 200 {
        return Err(RefineryError::ApiError(format!(
            "MyMemory status {}: {}",
            status, body.response_details
        )));
    }

    match body.response_data.translated_text {
        Some(text) if text.starts_with("MYMEMORY WARNING") => {
            Err(RefineryError::ApiError(format!("MyMemory quota: {}", text)))
        }
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(RefineryError::ApiError("MyMemory returned empty translation".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_orders() {
        assert_eq!(
            ProviderStrategy::default().provider_order(),
            vec![ProviderKind::Google, ProviderKind::MyMemory]
        );
        assert_eq!(ProviderStrategy::MyMemoryOnly.provider_order(), vec![ProviderKind::MyMemory]);
    }

    #[test]
    fn parses_provider_names() {
        assert_eq!("Google".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert_eq!("mymemory".parse::<ProviderKind>().unwrap(), ProviderKind::MyMemory);
        assert!("deepl".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn google_segments_are_concatenated() {
        let body = serde_json::json!([
            [["The water ", "آب", null, null], ["is dirty", "کثیف است", null, null]],
            null,
            "fa"
        ]);
        assert_eq!(parse_google_response(&body).unwrap(), "The water is dirty");
        assert!(parse_google_response(&serde_json::json!({"error": 1})).is_err());
    }

    #[test]
    fn mymemory_status_and_quota() {
        let ok: MyMemoryResponse = serde_json::from_value(serde_json::json!({
            "responseData": {"translatedText": "hello", "match": 1},
            "responseStatus": 200
        }))
        .unwrap();
        assert_eq!(parse_mymemory_response(ok).unwrap(), "hello");

        let quota: MyMemoryResponse = serde_json::from_value(serde_json::json!({
            "responseData": {"translatedText": "MYMEMORY WARNING: YOU USED ALL AVAILABLE FREE TRANSLATIONS"},
            "responseStatus": "200"
        }))
        .unwrap();
        assert!(parse_mymemory_response(quota).is_err());

        let failed: MyMemoryResponse = serde_json::from_value(serde_json::json!({
            "responseData": {"translatedText": null},
            "responseStatus": 403,
            "responseDetails": "INVALID LANGUAGE PAIR"
        }))
        .unwrap();
        assert!(parse_mymemory_response(failed).is_err());
    }

    #[test]
    fn llm_requires_key() {
        let api = ApiConfig::default();
        let client = http_client(&api).unwrap();
        assert!(build_provider(ProviderKind::Llm, &api, client.clone(), None).is_err());
        let provider = build_provider(ProviderKind::MyMemory, &api, client, None).unwrap();
        assert_eq!(provider.name(), "mymemory");
    }
}
