use crate::dataset::reader::{get_file_size, read_table};
use crate::language::is_dari_pashto_text;
use crate::utils::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tiktoken_rs::cl100k_base;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub total_rows: usize,
    pub total_columns: usize,
    pub column_names: Vec<String>,
    pub file_size_bytes: u64,
    /// Tokens an LLM provider would spend on the Dari/Pashto cells.
    pub estimated_tokens: usize,
    pub dari_pashto_cells: usize,
    pub sample_data: Vec<JsonValue>,
}

pub async fn analyze_dataset(
    file_path: &str,
    sheet: Option<&str>,
    sample_rows: usize,
) -> Result<DatasetMetadata> {
    let table = read_table(file_path, sheet)?;
    let file_size_bytes = get_file_size(file_path).await?;

    let translatable: Vec<&str> = table
        .rows
        .iter()
        .flat_map(|row| row.iter())
        .map(|cell| cell.as_str())
        .filter(|cell| is_dari_pashto_text(cell))
        .collect();

    Ok(DatasetMetadata {
        total_rows: table.row_count(),
        total_columns: table.column_count(),
        column_names: table.headers.clone(),
        file_size_bytes,
        estimated_tokens: estimate_cells_tokens(&translatable),
        dari_pashto_cells: translatable.len(),
        sample_data: table.head(sample_rows).to_json_records(),
    })
}

pub fn estimate_tokens(text: &str) -> usize {
    match cl100k_base() {
        Ok(bpe) => bpe.encode_with_special_tokens(text).len(),
        Err(_) => text.len() / 4,
    }
}

pub fn estimate_cells_tokens(cells: &[&str]) -> usize {
    let bpe = match cl100k_base() {
        Ok(b) => b,
        Err(_) => {
            let total_chars: usize = cells.iter().map(|s| s.len()).sum();
            return total_chars / 4;
        }
    };

    cells
        .iter()
        .map(|cell| bpe.encode_with_special_tokens(cell).len())
        .sum()
}
