// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Reads labelled rows from a delimited text file with a header
// row (e.g. the IMDB reviews CSV or the cyberbullying tweets
// CSV) using the csv crate.
//
// Columns are located by header name, so extra columns and
// column order do not matter. Fields are read as raw bytes and
// must be UTF-8: a non-text field is an InputType error, not a
// silently skipped row. With a cleaner attached, text fields go
// through TextCleaner::clean_bytes on the way in.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use std::path::PathBuf;

use crate::data::cleaner::TextCleaner;
use crate::domain::error::{ClfError, Result};
use crate::domain::example::Example;
use crate::domain::traits::DatasetSource;

/// Loads (text, label) pairs from a CSV file.
/// Implements the DatasetSource trait from Layer 3.
pub struct CsvLoader {
    path:         PathBuf,
    text_column:  String,
    label_column: String,
    /// Stop after this many rows (None = read everything)
    limit:        Option<usize>,
    cleaner:      Option<TextCleaner>,
}

impl CsvLoader {
    pub fn new(
        path:         impl Into<PathBuf>,
        text_column:  impl Into<String>,
        label_column: impl Into<String>,
    ) -> Self {
        Self {
            path:         path.into(),
            text_column:  text_column.into(),
            label_column: label_column.into(),
            limit:        None,
            cleaner:      None,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Clean every text field while loading.
    pub fn with_cleaner(mut self, cleaner: TextCleaner) -> Self {
        self.cleaner = Some(cleaner);
        self
    }
}

impl DatasetSource for CsvLoader {
    fn load_all(&self) -> Result<Vec<Example>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let headers   = reader.byte_headers()?.clone();
        let text_idx  = column_index(&headers, &self.text_column)?;
        let label_idx = column_index(&headers, &self.label_column)?;

        let mut examples = Vec::new();

        for (row, record) in reader.byte_records().enumerate() {
            if self.limit.is_some_and(|n| examples.len() >= n) {
                break;
            }
            let record = record?;

            // Short rows cannot be labelled — skip them but say so
            let (Some(text), Some(label)) = (record.get(text_idx), record.get(label_idx)) else {
                tracing::warn!("Skipping row {}: expected at least {} fields", row + 1,
                    text_idx.max(label_idx) + 1);
                continue;
            };

            let text = match &self.cleaner {
                Some(cleaner) => cleaner.clean_bytes(text).map_err(|_| not_text(row))?,
                None          => utf8_field(text, row)?,
            };
            examples.push(Example::new(text, utf8_field(label, row)?.trim()));
        }

        tracing::info!(
            "Loaded {} examples from '{}'",
            examples.len(),
            self.path.display()
        );
        Ok(examples)
    }
}

fn column_index(headers: &csv::ByteRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name.as_bytes())
        .ok_or_else(|| ClfError::Config(format!("column '{name}' not found in dataset header")))
}

fn utf8_field(raw: &[u8], row: usize) -> Result<String> {
    String::from_utf8(raw.to_vec()).map_err(|_| not_text(row))
}

fn not_text(row: usize) -> ClfError {
    ClfError::InputType(format!("row {}: field is not UTF-8 text", row + 1))
}
