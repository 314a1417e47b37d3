pub mod cache;
pub mod client;
pub mod extract;
pub mod job;
pub mod llm;
pub mod long_text;
pub mod provider;

pub use cache::TranslationCache;
pub use client::RobustTranslator;
pub use extract::{
    export_missing_translations, extract_missing_translations, missing_table, ExtractExports,
    MissingTranslation, DEFAULT_LIST_SHEET, DEFAULT_LIST_STEM,
};
pub use job::{
    export_job, job_summary, log_table, run_column_job, translation_log, ExportMode, JobExports,
    JobOptions, JobOutcome, JobProgress, JobReport, OutputMode, TranslationLogEntry,
};
pub use llm::LlmProvider;
pub use long_text::{TextChunker, DEFAULT_MAX_CHARS};
pub use provider::{
    build_provider, http_client, BoxFuture, GoogleWebProvider, MyMemoryProvider, ProviderKind,
    ProviderStrategy, TranslationProvider,
};

/// Splits `text` the way every provider call does, with the given character limit.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    TextChunker::new(max_chars).chunk(text)
}
