use crate::translation::provider::{BoxFuture, TranslationProvider};
use crate::utils::{RefineryError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const LLM_MAX_TOKENS: usize = 500;

/// Chat-completion translator. Each call asks the model to detect Dari/Pashto/English
/// and return a literal English rendering.
pub struct LlmProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

impl LlmProvider {
    pub fn new(client: Client, endpoint: &str, model: &str, api_key: String) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    async fn call_api(&self, prompt: String) -> Result<String> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: LLM_MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RefineryError::ApiError(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: AnthropicResponse = response.json().await?;
        extract_text(api_response)
    }
}

fn extract_text(response: AnthropicResponse) -> Result<String> {
    response
        .content
        .into_iter()
        .find_map(|block| {
            if block.content_type == "text" {
                block.text
            } else {
                None
            }
        })
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| RefineryError::ApiError("No text content in response".to_string()))
}

pub fn build_translation_prompt(text: &str, target: &str) -> String {
    let language = match target {
        "en" | "english" => "English".to_string(),
        other => other.to_string(),
    };
    format!(
        "Detect the language of this text (Dari, Pashto, or {language}).\n\
         If the text is Dari or Pashto, translate it into simple, human, non-native {language}.\n\
         Do NOT normalize or paraphrase. Keep the meaning exactly as is.\n\
         If the text is already in {language}, return it as is.\n\n\
         Text to translate:\n\"{text}\"\n\n\
         Translation:"
    )
}

impl TranslationProvider for LlmProvider {
    fn name(&self) -> &str {
        "llm"
    }

    fn translate<'a>(
        &'a self,
        text: &'a str,
        _source: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move { self.call_api(build_translation_prompt(text, target)).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_text_and_rules() {
        let prompt = build_translation_prompt("آب نیست", "en");
        assert!(prompt.contains("\"آب نیست\""));
        assert!(prompt.contains("Do NOT normalize or paraphrase"));
        assert!(prompt.contains("non-native English"));
        assert!(prompt.ends_with("Translation:"));
    }

    #[test]
    fn first_text_block_is_used() {
        let response: AnthropicResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "tool_use", "text": null},
                {"type": "text", "text": "  There is no water.  "}
            ]
        }))
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "There is no water.");

        let empty: AnthropicResponse =
            serde_json::from_value(serde_json::json!({"content": []})).unwrap();
        assert!(extract_text(empty).is_err());
    }
}
