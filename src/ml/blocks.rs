// ============================================================
// Layer 5 — Reduction Blocks
// ============================================================
// Every convolutional stage in the network is the same unit:
//
//   conv1d(k=6, p=2) → ReLU → [max-pool(2, stride 2)] → dropout
//
// A BlockSpec describes one stage; `BlockSpec::init` builds it.
// The trunk and every head are assembled from tables of specs
// rather than hand-written layer declarations.
//
// Length arithmetic for one block (floor division):
//   conv:  L_out = L + 2·padding − kernel + 1   (= L − 1 here)
//   pool:  L_out = L_conv / 2
//
// Reference: Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        pool::{MaxPool1d, MaxPool1dConfig},
        Dropout, DropoutConfig, PaddingConfig1d,
    },
    prelude::*,
};

pub const KERNEL_SIZE: usize = 6;
pub const PADDING: usize = 2;
pub const POOL_WINDOW: usize = 2;

/// Channel widths and pooling for one reduction block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpec {
    pub in_channels:  usize,
    pub out_channels: usize,
    pub kernel_size:  usize,
    pub padding:      usize,
    pub pooled:       bool,
}

impl BlockSpec {
    /// Trunk stage: convolution followed by 2× max-pooling.
    pub const fn pooled(in_channels: usize, out_channels: usize) -> Self {
        Self { in_channels, out_channels, kernel_size: KERNEL_SIZE, padding: PADDING, pooled: true }
    }

    /// Head stage: same convolution, no pooling.
    pub const fn unpooled(in_channels: usize, out_channels: usize) -> Self {
        Self { in_channels, out_channels, kernel_size: KERNEL_SIZE, padding: PADDING, pooled: false }
    }

    /// Sequence length after this block, or None if nothing is left.
    pub fn output_len(&self, input_len: usize) -> Option<usize> {
        let conv_len = (input_len + 2 * self.padding)
            .checked_sub(self.kernel_size)?
            + 1;
        let len = if self.pooled { conv_len / POOL_WINDOW } else { conv_len };
        (len > 0).then_some(len)
    }

    pub fn init<B: Backend>(&self, dropout: f64, device: &B::Device) -> ReductionBlock<B> {
        let conv = Conv1dConfig::new(self.in_channels, self.out_channels, self.kernel_size)
            .with_padding(PaddingConfig1d::Explicit(self.padding))
            .init(device);
        // MaxPool1dConfig defaults to stride 1
        let pool = self.pooled.then(|| {
            MaxPool1dConfig::new(POOL_WINDOW)
                .with_stride(POOL_WINDOW)
                .init()
        });
        let dropout = DropoutConfig::new(dropout).init();
        ReductionBlock { conv, pool, dropout }
    }
}

#[derive(Module, Debug)]
pub struct ReductionBlock<B: Backend> {
    pub conv:    Conv1d<B>,
    pub pool:    Option<MaxPool1d>,
    pub dropout: Dropout,
}

impl<B: Backend> ReductionBlock<B> {
    /// x: [batch, in_channels, L] → [batch, out_channels, L']
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = burn::tensor::activation::relu(self.conv.forward(x));
        let x = match &self.pool {
            Some(pool) => pool.forward(x),
            None       => x,
        };
        self.dropout.forward(x)
    }

    pub fn collect_shapes(&self, prefix: &str, out: &mut Vec<(String, Vec<usize>)>) {
        conv_shapes(&self.conv, &format!("{prefix}.conv"), out);
    }
}

/// Push `{prefix}.weight` and `{prefix}.bias` shapes of a convolution.
pub fn conv_shapes<B: Backend>(conv: &Conv1d<B>, prefix: &str, out: &mut Vec<(String, Vec<usize>)>) {
    out.push((format!("{prefix}.weight"), conv.weight.dims().to_vec()));
    if let Some(bias) = &conv.bias {
        out.push((format!("{prefix}.bias"), bias.dims().to_vec()));
    }
}
