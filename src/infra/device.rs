// ============================================================
// Layer 6 — Compute Device Selection
// ============================================================
//   auto → WGPU "default device" when the graphics API burn
//          drives (Vulkan, Metal on macOS) exposes an adapter,
//          otherwise the NdArray backend on the host CPU
//   gpu  → first discrete GPU through WGPU; an error if that
//          graphics API has no discrete adapter
//   cpu  → the NdArray backend on the host CPU
//
// The choice is resolved once, before any tensor is allocated,
// into a ComputeDevice. The two backends are different Rust
// types, so callers match on it and run one generic code path
// per backend.

use anyhow::{bail, Result};
use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::{AutoGraphicsApi, GraphicsApi, WgpuDevice},
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub type GpuBackend = burn::backend::Wgpu;
pub type CpuBackend = burn::backend::NdArray;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Auto,
    Gpu,
    Cpu,
}

/// A concrete device on one of the two backends.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeDevice {
    Wgpu(WgpuDevice),
    Cpu(NdArrayDevice),
}

impl DeviceKind {
    /// Enumerate wgpu adapters and pick the device.
    pub fn resolve(self) -> Result<ComputeDevice> {
        self.resolve_with(wgpu_adapter_types)
    }

    /// Same as `resolve`, with the adapter enumeration supplied by the
    /// caller. It only runs for `auto` and `gpu`.
    pub fn resolve_with(
        self,
        adapter_types: impl FnOnce() -> Vec<wgpu::DeviceType>,
    ) -> Result<ComputeDevice> {
        match self {
            DeviceKind::Cpu => Ok(ComputeDevice::Cpu(NdArrayDevice::Cpu)),
            DeviceKind::Auto => {
                if adapter_types().is_empty() {
                    tracing::warn!(
                        "No {:?} adapter found, falling back to the NdArray CPU backend",
                        burn_graphics_backend()
                    );
                    Ok(ComputeDevice::Cpu(NdArrayDevice::Cpu))
                } else {
                    Ok(ComputeDevice::Wgpu(WgpuDevice::default()))
                }
            }
            DeviceKind::Gpu => {
                let types = adapter_types();
                if !types.contains(&wgpu::DeviceType::DiscreteGpu) {
                    bail!(
                        "--device gpu requested but {:?} exposes no discrete GPU adapter (found {:?})",
                        burn_graphics_backend(),
                        types
                    );
                }
                Ok(ComputeDevice::Wgpu(WgpuDevice::DiscreteGpu(0)))
            }
        }
    }
}

/// The graphics API burn's `Wgpu` backend opens its device on.
pub fn burn_graphics_backend() -> wgpu::Backend {
    <AutoGraphicsApi as GraphicsApi>::backend()
}

/// Device types of every adapter on that graphics API. Adapters on
/// other APIs (a GL software rasteriser, say) are not counted,
/// since burn would never open them.
pub fn wgpu_adapter_types() -> Vec<wgpu::DeviceType> {
    let backends: wgpu::Backends = burn_graphics_backend().into();
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends,
        ..Default::default()
    });
    instance
        .enumerate_adapters(backends)
        .iter()
        .map(|adapter| adapter.get_info().device_type)
        .collect()
}
