// ============================================================
// Layer 5 — Feature Trunk
// ============================================================
// Ten pooled reduction blocks shared by every task head.
// Channel depth doubles every second block while the sequence
// halves each time:
//
//   block   channels     length (L = 3501)
//   ─────   ──────────   ─────────────────
//     0       1 →  16        1750
//     1      16 →  16         874
//     2      16 →  32         436
//     3      32 →  32         217
//     4      32 →  64         108
//     5      64 →  64          53
//     6      64 → 128          26
//     7     128 → 128          12
//     8     128 → 256           5
//     9     256 → 256           2

use burn::prelude::*;

use crate::ml::blocks::{BlockSpec, ReductionBlock};

pub const INPUT_CHANNELS: usize = 1;

pub const TRUNK_BLOCKS: [BlockSpec; 10] = [
    BlockSpec::pooled(1, 16),
    BlockSpec::pooled(16, 16),
    BlockSpec::pooled(16, 32),
    BlockSpec::pooled(32, 32),
    BlockSpec::pooled(32, 64),
    BlockSpec::pooled(64, 64),
    BlockSpec::pooled(64, 128),
    BlockSpec::pooled(128, 128),
    BlockSpec::pooled(128, 256),
    BlockSpec::pooled(256, 256),
];

/// Channel width of the trunk output.
pub const TRUNK_CHANNELS: usize = TRUNK_BLOCKS[TRUNK_BLOCKS.len() - 1].out_channels;

#[derive(Module, Debug)]
pub struct FeatureTrunk<B: Backend> {
    pub blocks: Vec<ReductionBlock<B>>,
}

impl<B: Backend> FeatureTrunk<B> {
    pub fn new(specs: &[BlockSpec], dropout: f64, device: &B::Device) -> Self {
        let blocks = specs.iter().map(|s| s.init(dropout, device)).collect();
        Self { blocks }
    }

    /// x: [batch, 1, L] → [batch, 256, L_trunk]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.blocks.iter().fold(x, |x, block| block.forward(x))
    }

    pub fn collect_shapes(&self, out: &mut Vec<(String, Vec<usize>)>) {
        for (i, block) in self.blocks.iter().enumerate() {
            block.collect_shapes(&format!("trunk.blocks.{i}"), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_channels_chain() {
        assert_eq!(TRUNK_BLOCKS[0].in_channels, INPUT_CHANNELS);
        for pair in TRUNK_BLOCKS.windows(2) {
            assert_eq!(pair[0].out_channels, pair[1].in_channels);
        }
        assert_eq!(TRUNK_CHANNELS, 256);
    }

    #[test]
    fn test_reference_length_schedule() {
        let lengths: Vec<usize> = TRUNK_BLOCKS
            .iter()
            .scan(3501usize, |len, spec| {
                *len = spec.output_len(*len)?;
                Some(*len)
            })
            .collect();
        assert_eq!(lengths, vec![1750, 874, 436, 217, 108, 53, 26, 12, 5, 2]);
    }

    #[test]
    fn test_trunk_preserves_batch() {
        let device = Default::default();
        let trunk = FeatureTrunk::<TestBackend>::new(&TRUNK_BLOCKS, 0.3, &device);
        for batch in [1, 3] {
            let x = Tensor::<TestBackend, 3>::zeros([batch, 1, 3501], &device);
            assert_eq!(trunk.forward(x).dims(), [batch, 256, 2]);
        }
    }

    #[test]
    fn test_trunk_shape_names() {
        let device = Default::default();
        let trunk = FeatureTrunk::<TestBackend>::new(&TRUNK_BLOCKS, 0.3, &device);
        let mut shapes = Vec::new();
        trunk.collect_shapes(&mut shapes);
        // weight + bias per block
        assert_eq!(shapes.len(), 20);
        assert_eq!(shapes[0], ("trunk.blocks.0.conv.weight".to_string(), vec![16, 1, 6]));
        assert_eq!(shapes[19], ("trunk.blocks.9.conv.bias".to_string(), vec![256]));
    }
}
