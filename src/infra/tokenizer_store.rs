// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads a pretrained tokenizer.json, or builds a word-level
// vocabulary from the cleaned training corpus and writes it in
// HuggingFace tokenizer JSON format.
//
// Building the JSON directly and loading it back with
// Tokenizer::from_file avoids the trainer / ModelWrapper type
// mismatch of tokenizers 0.15.
//
// Special tokens take the first ids so the embedding table
// only needs (number of tokens) rows:
//   [PAD]=0  [UNK]=1  [CLS]=2  [SEP]=3  [MASK]=4

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokenizers::Tokenizer;

use crate::domain::error::{ClfError, Result};

pub const TOKENIZER_FILE: &str = "tokenizer.json";

const SPECIAL_TOKENS: [&str; 5] = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]"];

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Load a previously saved (or pretrained) tokenizer.
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path).map_err(|e| {
            ClfError::ResourceUnavailable(format!(
                "cannot load tokenizer from '{}': {e}",
                path.display()
            ))
        })
    }

    pub fn save(&self, tokenizer: &Tokenizer) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path();
        tokenizer
            .save(&path, true)
            .map_err(|e| ClfError::Artifact(format!("cannot write '{}': {e}", path.display())))
    }

    /// Build a word-level vocabulary of at most `vocab_size` entries
    /// (special tokens included) from `texts`, save it, and load it back.
    pub fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir)?;

        let mut freq: HashMap<&str, usize> = HashMap::new();
        for text in texts {
            for word in text.split_whitespace() {
                *freq.entry(word).or_insert(0) += 1;
            }
        }

        // Most frequent first; ties broken alphabetically so builds are reproducible
        let mut words: Vec<(&str, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        words.truncate(vocab_size.saturating_sub(SPECIAL_TOKENS.len()));

        let mut vocab = serde_json::Map::new();
        for (id, token) in SPECIAL_TOKENS.iter().enumerate() {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        for (word, _) in &words {
            if !vocab.contains_key(*word) {
                let id = vocab.len();
                vocab.insert(word.to_string(), serde_json::json!(id));
            }
        }
        let size = vocab.len();

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .enumerate()
            .map(|(id, token)| serde_json::json!({
                "id": id, "content": token, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let path = self.path();
        std::fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)?;

        tracing::info!("Tokenizer built with {} tokens, saved to '{}'", size, path.display());

        Tokenizer::from_file(&path)
            .map_err(|e| ClfError::Artifact(format!("cannot reload built tokenizer: {e}")))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_assigns_contiguous_ids() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let texts = vec!["great film great".to_string(), "awful film".to_string()];
        let tok   = store.build_and_save(&texts, 100).unwrap();

        assert_eq!(tok.token_to_id("[PAD]"), Some(0));
        assert_eq!(tok.token_to_id("[SEP]"), Some(3));
        // "film" and "great" both occur twice; alphabetical tie-break
        assert_eq!(tok.token_to_id("film"), Some(5));
        assert_eq!(tok.token_to_id("great"), Some(6));
        assert_eq!(tok.token_to_id("awful"), Some(7));
        assert_eq!(tok.get_vocab_size(true), 8);
    }

    #[test]
    fn test_vocab_size_caps_words() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let texts = vec!["a b c d e f g".to_string()];
        let tok   = store.build_and_save(&texts, 7).unwrap();
        assert_eq!(tok.get_vocab_size(true), 7);

        // Unknown words map to [UNK]
        let enc = tok.encode("zzz", false).unwrap();
        assert_eq!(enc.get_ids(), &[1]);
    }

    #[test]
    fn test_saved_tokenizer_reloads() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let tok   = store.build_and_save(&["hello world".to_string()], 50).unwrap();

        let other = tempfile::tempdir().unwrap();
        TokenizerStore::new(other.path()).save(&tok).unwrap();
        let back = TokenizerStore::new(other.path()).load().unwrap();
        assert_eq!(back.token_to_id("world"), tok.token_to_id("world"));
    }

    #[test]
    fn test_missing_tokenizer_is_resource_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TokenizerStore::new(dir.path()).load(),
            Err(ClfError::ResourceUnavailable(_))
        ));
    }
}
