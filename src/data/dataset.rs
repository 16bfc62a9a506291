// ============================================================
// Layer 4 — Tokenized Example Provider
// ============================================================
// Turns cleaned, label-encoded texts into fixed-length model
// inputs on demand:
//
//   [CLS] tok_1 tok_2 ... tok_k [SEP] [PAD] ... [PAD]
//   └────────── k ≤ L-2 ──────────┘
//   attention_mask = 1 for [CLS], tokens and [SEP], 0 for padding
//
// Every encoded example has exactly L ids and L mask values.
// Texts longer than L-2 tokens are cut from the end.
//
// ClfDataset implements Burn's Dataset trait (get + len), so
// Burn's DataLoader can shuffle and batch it.
//
// Reference: Burn Book §4 (Datasets)
//            Devlin et al. (2019) BERT input format

use std::sync::Arc;

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::domain::error::{ClfError, Result};
use crate::domain::example::LabeledText;

/// [CLS] + [SEP]
const SPECIAL_TOKENS: usize = 2;

/// Token ids and attention mask for one text, both of length L.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedText {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
}

/// One fully tokenised and padded training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedExample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

impl EncodedExample {
    pub fn new(encoded: EncodedText, label: usize) -> Self {
        Self {
            input_ids:      encoded.input_ids,
            attention_mask: encoded.attention_mask,
            label,
        }
    }
}

/// Wraps a tokenizer with the fixed-length framing rules above.
#[derive(Clone)]
pub struct SequenceEncoder {
    tokenizer:  Arc<Tokenizer>,
    max_length: usize,
    cls_id:     u32,
    sep_id:     u32,
    pad_id:     u32,
}

impl SequenceEncoder {
    pub fn new(tokenizer: Arc<Tokenizer>, max_length: usize) -> Result<Self> {
        if max_length < SPECIAL_TOKENS {
            return Err(ClfError::Config(format!(
                "max length {max_length} cannot hold [CLS] and [SEP]"
            )));
        }
        let special = |token: &str| {
            tokenizer.token_to_id(token).ok_or_else(|| {
                ClfError::ResourceUnavailable(format!("tokenizer has no {token} token"))
            })
        };
        let cls_id = special("[CLS]")?;
        let sep_id = special("[SEP]")?;
        let pad_id = special("[PAD]")?;
        // Without [UNK] a word-level model fails on out-of-vocabulary words
        special("[UNK]")?;

        Ok(Self { tokenizer, max_length, cls_id, sep_id, pad_id })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Smallest embedding table that can index every id this tokenizer emits
    pub fn vocab_size(&self) -> usize {
        self.tokenizer
            .get_vocab(true)
            .values()
            .max()
            .map_or(0, |&id| id as usize + 1)
    }

    pub fn encode(&self, text: &str) -> Result<EncodedText> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| ClfError::InputType(format!("tokenisation failed: {e}")))?;

        let capacity = self.max_length - SPECIAL_TOKENS;
        let ids      = encoding.get_ids();
        let kept     = &ids[..ids.len().min(capacity)];

        let mut input_ids = Vec::with_capacity(self.max_length);
        input_ids.push(self.cls_id);
        input_ids.extend_from_slice(kept);
        input_ids.push(self.sep_id);

        let real = input_ids.len();
        input_ids.resize(self.max_length, self.pad_id);

        let mut attention_mask = vec![1u32; real];
        attention_mask.resize(self.max_length, 0);

        Ok(EncodedText { input_ids, attention_mask })
    }
}

/// Random-access view over labelled texts that encodes on `get`.
#[derive(Clone)]
pub struct ClfDataset {
    items:   Arc<Vec<LabeledText>>,
    encoder: SequenceEncoder,
}

impl ClfDataset {
    pub fn new(items: Vec<LabeledText>, encoder: SequenceEncoder) -> Self {
        Self { items: Arc::new(items), encoder }
    }

    pub fn encode(&self, index: usize) -> Result<Option<EncodedExample>> {
        let Some(item) = self.items.get(index) else {
            return Ok(None);
        };
        let encoded = self.encoder.encode(&item.text)?;
        Ok(Some(EncodedExample::new(encoded, item.label)))
    }

    /// Number of examples per class, indexed by class id
    pub fn class_counts(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0usize; num_classes];
        for item in self.items.iter() {
            if let Some(c) = counts.get_mut(item.label) {
                *c += 1;
            }
        }
        counts
    }
}

impl Dataset<EncodedExample> for ClfDataset {
    /// The DataLoader reads `None` as the end of the data, so a
    /// failed encoding cuts the current epoch short.
    fn get(&self, index: usize) -> Option<EncodedExample> {
        match self.encode(index) {
            Ok(example) => example,
            Err(e) => {
                tracing::error!("Cannot encode example {index}: {e}");
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::infra::tokenizer_store::TokenizerStore;
    use proptest::prelude::*;

    /// Word-level tokenizer over a tiny vocabulary, built in a temp dir
    pub(crate) fn test_tokenizer(corpus: &[&str]) -> Arc<Tokenizer> {
        let dir   = tempfile::tempdir().unwrap();
        let texts: Vec<String> = corpus.iter().map(|s| s.to_string()).collect();
        let tok   = TokenizerStore::new(dir.path()).build_and_save(&texts, 1000).unwrap();
        Arc::new(tok)
    }

    #[test]
    fn test_short_text_is_padded() {
        let tok = test_tokenizer(&["good film"]);
        let enc = SequenceEncoder::new(tok.clone(), 6).unwrap();
        let out = enc.encode("good film").unwrap();

        let cls = tok.token_to_id("[CLS]").unwrap();
        let sep = tok.token_to_id("[SEP]").unwrap();
        let pad = tok.token_to_id("[PAD]").unwrap();

        assert_eq!(out.input_ids.len(), 6);
        assert_eq!(out.input_ids[0], cls);
        assert_eq!(out.input_ids[3], sep);
        assert_eq!(&out.input_ids[4..], &[pad, pad]);
        assert_eq!(out.attention_mask, vec![1, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_long_text_is_cut_from_the_end() {
        let tok = test_tokenizer(&["one two three four five"]);
        let enc = SequenceEncoder::new(tok.clone(), 4).unwrap();
        let out = enc.encode("one two three four five").unwrap();

        let one = tok.token_to_id("one").unwrap();
        let two = tok.token_to_id("two").unwrap();
        assert_eq!(out.input_ids[1..3], [one, two]);
        assert_eq!(out.input_ids[3], tok.token_to_id("[SEP]").unwrap());
        assert_eq!(out.attention_mask, vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_max_length_below_two_rejected() {
        let tok = test_tokenizer(&["x"]);
        assert!(matches!(SequenceEncoder::new(tok, 1), Err(ClfError::Config(_))));
    }

    #[test]
    fn test_tokenizer_without_unk_rejected() {
        let json = r#"{
            "version": "1.0", "truncation": null, "padding": null, "added_tokens": [],
            "normalizer": null, "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null, "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": { "[PAD]": 0, "[CLS]": 1, "[SEP]": 2, "good": 3 },
                "unk_token": "[UNK]"
            }
        }"#;
        let tok: Tokenizer = json.parse().unwrap();
        assert!(matches!(
            SequenceEncoder::new(Arc::new(tok), 6),
            Err(ClfError::ResourceUnavailable(_))
        ));
    }

    #[test]
    fn test_unknown_words_still_encode() {
        let tok = test_tokenizer(&["good film"]);
        let unk = tok.token_to_id("[UNK]").unwrap();
        let enc = SequenceEncoder::new(tok, 5).unwrap();
        let out = enc.encode("zebra").unwrap();
        assert_eq!(out.input_ids[1], unk);
    }

    #[test]
    fn test_dataset_random_access() {
        let tok   = test_tokenizer(&["good bad"]);
        let enc   = SequenceEncoder::new(tok, 5).unwrap();
        let items = vec![
            LabeledText { text: "good".into(), label: 1 },
            LabeledText { text: "bad".into(),  label: 0 },
        ];
        let ds = ClfDataset::new(items, enc);

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(1).unwrap().label, 0);
        assert!(ds.get(2).is_none());
        assert_eq!(ds.class_counts(2), vec![1, 1]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_encoded_length_is_exactly_max_length(
            words in proptest::collection::vec("[a-z]{1,6}", 0..40),
            max_length in 2usize..32,
        ) {
            let tok = test_tokenizer(&["alpha beta gamma"]);
            let enc = SequenceEncoder::new(tok, max_length).unwrap();
            let out = enc.encode(&words.join(" ")).unwrap();
            prop_assert_eq!(out.input_ids.len(), max_length);
            prop_assert_eq!(out.attention_mask.len(), max_length);
        }
    }
}
