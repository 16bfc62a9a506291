// ============================================================
// Layer 4 — Classification Batcher
// ============================================================
// Implements Burn's Batcher trait to stack EncodedExamples
// into tensors.
//
//   Input:  Vec of N EncodedExamples, each of length L
//   Output: ClfBatch with input_ids/attention_mask [N, L]
//           and labels [N]
//
// All examples are already padded to L by the provider, so
// stacking is a flatten + reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::EncodedExample;

/// A batch of examples ready for the classifier forward pass.
#[derive(Debug, Clone)]
pub struct ClfBatch<B: Backend> {
    /// Token ids — shape: [batch_size, max_length]
    pub input_ids: Tensor<B, 2, Int>,

    /// 1 = real or special token, 0 = padding — shape: [batch_size, max_length]
    pub attention_mask: Tensor<B, 2, Int>,

    /// Class index per example — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct ClfBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ClfBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<EncodedExample, ClfBatch<B>> for ClfBatcher<B> {
    fn batch(&self, items: Vec<EncodedExample>) -> ClfBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map_or(0, |e| e.input_ids.len());

        // Burn Int tensors are built from i32
        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|e| e.input_ids.iter().map(|&x| x as i32))
            .collect();

        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|e| e.attention_mask.iter().map(|&x| x as i32))
            .collect();

        let labels: Vec<i32> = items.iter().map(|e| e.label as i32).collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(input_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(mask_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ClfBatch { input_ids, attention_mask, labels }
    }
}
