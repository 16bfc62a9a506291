use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig, Embedding, EmbeddingConfig, LayerNorm, LayerNormConfig,
        transformer::{PositionWiseFeedForward, PositionWiseFeedForwardConfig},
        Linear, LinearConfig,
    },
    prelude::*,
    train::ClassificationOutput,
};

use crate::data::batcher::ClfBatch;

/// BERT-style encoder dimensions. Saved in every artifact manifest.
#[derive(Config, Debug)]
pub struct TextEncoderConfig {
    pub vocab_size:  usize,
    /// Number of learned positions; inputs may not be longer
    pub max_seq_len: usize,
    #[config(default = 256)]
    pub d_model:     usize,
    #[config(default = 4)]
    pub num_heads:   usize,
    #[config(default = 4)]
    pub num_layers:  usize,
    #[config(default = 1024)]
    pub d_ff:        usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
}

impl TextEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextEncoder<B> {
        TextEncoder {
            tokens:    EmbeddingConfig::new(self.vocab_size, self.d_model).init(device),
            positions: EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device),
            blocks:    (0..self.num_layers).map(|_| self.init_block(device)).collect(),
            norm:      LayerNormConfig::new(self.d_model).init(device),
            dropout:   DropoutConfig::new(self.dropout).init(),
        }
    }

    fn init_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        EncoderBlock {
            attention: MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
                .with_dropout(self.dropout)
                .init(device),
            feed_forward: PositionWiseFeedForwardConfig::new(self.d_model, self.d_ff)
                .with_dropout(self.dropout)
                .init(device),
            attn_norm: LayerNormConfig::new(self.d_model).init(device),
            ffn_norm:  LayerNormConfig::new(self.d_model).init(device),
            dropout:   DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// Post-norm transformer layer: attention and GELU feed-forward,
/// each wrapped in a residual connection.
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub attention:    MultiHeadAttention<B>,
    pub feed_forward: PositionWiseFeedForward<B>,
    pub attn_norm:    LayerNorm<B>,
    pub ffn_norm:     LayerNorm<B>,
    pub dropout:      Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `pad_mask` is true at padding positions, which attention ignores.
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attended = self
            .attention
            .forward(MhaInput::self_attn(x.clone()).mask_pad(pad_mask))
            .context;
        let x = self.attn_norm.forward(x + self.dropout.forward(attended));

        let transformed = self.feed_forward.forward(x.clone());
        self.ffn_norm.forward(x + self.dropout.forward(transformed))
    }
}

/// Transformer encoder body. This is the part a pretrained
/// checkpoint provides; the classification head is always fresh.
#[derive(Module, Debug)]
pub struct TextEncoder<B: Backend> {
    pub tokens:    Embedding<B>,
    pub positions: Embedding<B>,
    pub blocks:    Vec<EncoderBlock<B>>,
    pub norm:      LayerNorm<B>,
    pub dropout:   Dropout,
}

impl<B: Backend> TextEncoder<B> {
    /// input_ids, attention_mask: [batch, seq_len] → hidden states [batch, seq_len, d_model]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let [batch, seq_len] = input_ids.dims();
        let device = input_ids.device();

        let position_ids = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .reshape([1, seq_len])
            .repeat_dim(0, batch);
        let embedded = self.tokens.forward(input_ids) + self.positions.forward(position_ids);

        let pad_mask = attention_mask.equal_elem(0);
        let hidden = self
            .blocks
            .iter()
            .fold(self.dropout.forward(embedded), |x, block| block.forward(x, pad_mask.clone()));

        self.norm.forward(hidden)
    }
}

#[derive(Config, Debug)]
pub struct ClassifierConfig {
    pub encoder:     TextEncoderConfig,
    pub num_classes: usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
}

impl ClassifierConfig {
    /// Randomly initialised encoder and head
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransformerClassifier<B> {
        self.init_with_encoder(self.encoder.init(device), device)
    }

    /// Attach a fresh classification head to an existing (e.g. pretrained) encoder
    pub fn init_with_encoder<B: Backend>(
        &self,
        encoder: TextEncoder<B>,
        device:  &B::Device,
    ) -> TransformerClassifier<B> {
        let head    = LinearConfig::new(self.encoder.d_model, self.num_classes).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        TransformerClassifier { encoder, head, dropout }
    }
}

#[derive(Module, Debug)]
pub struct TransformerClassifier<B: Backend> {
    pub encoder: TextEncoder<B>,
    pub head:    Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> TransformerClassifier<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits [batch, num_classes]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let hidden = self.encoder.forward(input_ids, attention_mask.clone());
        let pooled = masked_mean(hidden, attention_mask);
        self.head.forward(self.dropout.forward(pooled))
    }

    /// Forward pass plus cross-entropy loss against the batch labels.
    pub fn forward_classification(&self, batch: ClfBatch<B>) -> ClassificationOutput<B> {
        let logits = self.forward(batch.input_ids, batch.attention_mask);
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), batch.labels.clone());
        ClassificationOutput::new(loss, logits, batch.labels)
    }
}

/// Mean of the hidden states over positions where the mask is 1.
fn masked_mean<B: Backend>(hidden: Tensor<B, 3>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 2> {
    let [batch_size, _, d_model] = hidden.dims();
    let mask   = attention_mask.float().unsqueeze_dim::<3>(2); // [batch, seq_len, 1]
    let summed = (hidden * mask.clone()).sum_dim(1);            // [batch, 1, d_model]
    let counts = mask.sum_dim(1).clamp_min(1.0);                // [batch, 1, 1]
    (summed / counts).reshape([batch_size, d_model])
}
