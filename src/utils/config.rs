use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub translation: TranslationDefaults,
    pub api: ApiConfig,
    pub workbook: WorkbookConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub http_port: u16,
    /// Finished translation jobs are dropped from the registry after this long.
    #[serde(default = "default_job_ttl_seconds")]
    pub job_ttl_seconds: u64,
}

fn default_job_ttl_seconds() -> u64 {
    24 * 60 * 60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationDefaults {
    pub target_lang: String,
    pub provider_order: Vec<String>,
    pub retries: usize,
    pub backoff_base_ms: u64,
    pub chunk_max_chars: usize,
    pub chunk_delay_ms: u64,
    pub row_delay_ms: u64,
    pub batch_size: usize,
    pub cache_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub google_endpoint: String,
    pub mymemory_endpoint: String,
    pub mymemory_email: Option<String>,
    pub llm_endpoint: String,
    pub llm_model: String,
    pub llm_api_key_env: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookConfig {
    pub db_path: PathBuf,
    pub data_sheet: String,
    pub correction_sheet: String,
    pub review_log_sheet: String,
    pub remove_sheet: String,
    pub hidden_sheet: String,
    pub hidden_label_column: String,
    pub id_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub translation_list_sheet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "survey-refinery-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                http_port: 9527,
                job_ttl_seconds: default_job_ttl_seconds(),
            },
            translation: TranslationDefaults {
                target_lang: "en".to_string(),
                provider_order: vec!["google".to_string(), "mymemory".to_string()],
                retries: 3,
                backoff_base_ms: 600,
                chunk_max_chars: 4500,
                chunk_delay_ms: 150,
                row_delay_ms: 150,
                batch_size: 10,
                cache_size: 10000,
            },
            api: ApiConfig {
                google_endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
                mymemory_endpoint: "https://api.mymemory.translated.net/get".to_string(),
                mymemory_email: None,
                llm_endpoint: "https://api.anthropic.com/v1/messages".to_string(),
                llm_model: "claude-3-5-haiku-latest".to_string(),
                llm_api_key_env: "ANTHROPIC_API_KEY".to_string(),
                timeout_seconds: 60,
            },
            workbook: WorkbookConfig::default(),
            export: ExportConfig {
                output_dir: PathBuf::from("./data/exports"),
                translation_list_sheet: "Translation_List".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        AppConfig::default().server
    }
}

impl Default for TranslationDefaults {
    fn default() -> Self {
        AppConfig::default().translation
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        AppConfig::default().api
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        AppConfig::default().export
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        AppConfig::default().logging
    }
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/workbook.redb"),
            data_sheet: "Data_Set".to_string(),
            correction_sheet: "Correction_Log".to_string(),
            review_log_sheet: "Correction_Log_1".to_string(),
            remove_sheet: "Remove_from_DS".to_string(),
            hidden_sheet: "Not_Show_in_form".to_string(),
            hidden_label_column: "Labels".to_string(),
            id_column: "_uuid".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> crate::utils::errors::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::utils::errors::RefineryError::ConfigError(e.to_string()))?;
        toml::from_str(&content)
            .map_err(|e| crate::utils::errors::RefineryError::ConfigError(e.to_string()))
    }

    pub fn load_or_default(path: Option<&str>) -> Self {
        if let Some(p) = path {
            Self::load_from_file(p).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Reads the LLM key from the environment variable named in `api.llm_api_key_env`.
    pub fn llm_api_key(&self) -> Option<String> {
        std::env::var(&self.api.llm_api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[workbook]
db_path = "/tmp/wb.redb"
data_sheet = "Main"
correction_sheet = "Correction_Log"
review_log_sheet = "Correction_Log_1"
remove_sheet = "Remove_from_DS"
hidden_sheet = "Not_Show_in_form"
hidden_label_column = "Labels"
id_column = "_uuid"
"#,
        )
        .unwrap();

        assert_eq!(config.workbook.data_sheet, "Main");
        assert_eq!(config.translation.retries, 3);
        assert_eq!(config.translation.chunk_max_chars, 4500);
        assert_eq!(config.translation.provider_order, vec!["google", "mymemory"]);
        assert_eq!(config.server.job_ttl_seconds, 86_400);
    }

    #[test]
    fn server_section_without_job_ttl() {
        let config: AppConfig = toml::from_str(
            r#"
[server]
name = "survey-refinery-mcp"
version = "0.1.0"
http_port = 8080
"#,
        )
        .unwrap();
        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.server.job_ttl_seconds, 86_400);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_or_default(Some("/definitely/not/here.toml"));
        assert_eq!(config.workbook.id_column, "_uuid");
        assert_eq!(config.translation.batch_size, 10);
    }
}
