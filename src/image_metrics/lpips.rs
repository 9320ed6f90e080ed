// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Learned perceptual image patch similarity (LPIPS, AlexNet variant)
//!
//! Weights are read from a safetensors file laid out as
//! - `features.{0,3,6,8,10}.{weight,bias}`: the AlexNet convolutional trunk
//! - `lin{0..4}.model.1.weight`: the 1x1 per-layer heads, no bias

use crate::config::DeviceKind;
use crate::error::EvalError;
use anyhow::{Context, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{conv2d, conv2d_no_bias, Conv2d, Conv2dConfig, VarBuilder};
use image::RgbImage;
use std::path::Path;
use tracing::info;

/// Trunk output channels at each tap
pub const TAP_CHANNELS: [usize; 5] = [64, 192, 384, 256, 256];

/// Smallest image edge the trunk can reduce without running out of pixels:
/// 31 -> conv1 7 -> pool 3 -> pool 1
pub const MIN_SIDE: u32 = 31;

// Input scaling layer constants
const SHIFT: [f32; 3] = [-0.030, -0.088, -0.188];
const SCALE: [f32; 3] = [0.458, 0.448, 0.450];

fn conv_config(padding: usize, stride: usize) -> Conv2dConfig {
    Conv2dConfig {
        padding,
        stride,
        ..Default::default()
    }
}

/// LPIPS network bound to one device
pub struct Lpips {
    trunk: [Conv2d; 5],
    heads: Vec<Conv2d>,
    shift: Tensor,
    scale: Tensor,
    device: Device,
}

impl Lpips {
    /// Load weights from a safetensors file onto the configured device
    pub fn load(weights: &Path, device: DeviceKind, ordinal: usize) -> Result<Self> {
        let device = device.open(ordinal)?;
        info!(path = %weights.display(), device = ?device, "loading LPIPS weights");

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device)
                .with_context(|| format!("Failed to read LPIPS weights: {}", weights.display()))?
        };
        Self::from_var_builder(vb)
    }

    /// Build the network from any weight source
    pub fn from_var_builder(vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();
        let features = vb.pp("features");

        let trunk = [
            conv2d(3, 64, 11, conv_config(2, 4), features.pp("0"))?,
            conv2d(64, 192, 5, conv_config(2, 1), features.pp("3"))?,
            conv2d(192, 384, 3, conv_config(1, 1), features.pp("6"))?,
            conv2d(384, 256, 3, conv_config(1, 1), features.pp("8"))?,
            conv2d(256, 256, 3, conv_config(1, 1), features.pp("10"))?,
        ];

        let heads = TAP_CHANNELS
            .iter()
            .enumerate()
            .map(|(i, &channels)| {
                conv2d_no_bias(
                    channels,
                    1,
                    1,
                    Default::default(),
                    vb.pp(format!("lin{}", i)).pp("model").pp("1"),
                )
            })
            .collect::<candle_core::Result<Vec<_>>>()?;

        let shift = Tensor::new(&SHIFT, &device)?.reshape((1, 3, 1, 1))?;
        let scale = Tensor::new(&SCALE, &device)?.reshape((1, 3, 1, 1))?;

        Ok(Self {
            trunk,
            heads,
            shift,
            scale,
            device,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// `(1, 3, H, W)` tensor with channels in `[0, 1]`
    pub fn image_tensor(&self, image: &RgbImage) -> Result<Tensor> {
        let (width, height) = image.dimensions();
        let data: Vec<f32> = image.as_raw().iter().map(|v| *v as f32 / 255.0).collect();
        let tensor = Tensor::from_vec(data, (height as usize, width as usize, 3), &self.device)?
            .permute((2, 0, 1))?
            .unsqueeze(0)?
            .contiguous()?;
        Ok(tensor)
    }

    /// Activations at the five ReLU taps
    fn taps(&self, input: &Tensor) -> candle_core::Result<Vec<Tensor>> {
        // [0, 1] -> [-1, 1], then the fixed scaling layer
        let x = input
            .affine(2.0, -1.0)?
            .broadcast_sub(&self.shift)?
            .broadcast_div(&self.scale)?;

        let h1 = self.trunk[0].forward(&x)?.relu()?;
        let h2 = self.trunk[1]
            .forward(&h1.max_pool2d_with_stride(3, 2)?)?
            .relu()?;
        let h3 = self.trunk[2]
            .forward(&h2.max_pool2d_with_stride(3, 2)?)?
            .relu()?;
        let h4 = self.trunk[3].forward(&h3)?.relu()?;
        let h5 = self.trunk[4].forward(&h4)?.relu()?;
        Ok(vec![h1, h2, h3, h4, h5])
    }

    /// Distance between two `(1, 3, H, W)` tensors in `[0, 1]`
    pub fn distance_tensors(&self, a: &Tensor, b: &Tensor) -> Result<f32> {
        let taps_a = self.taps(a)?;
        let taps_b = self.taps(b)?;

        let mut total = 0.0f32;
        for ((fa, fb), head) in taps_a.iter().zip(&taps_b).zip(&self.heads) {
            let diff = unit_normalize(fa)?.sub(&unit_normalize(fb)?)?.sqr()?;
            let layer = head.forward(&diff)?.mean_all()?.to_scalar::<f32>()?;
            total += layer;
        }
        Ok(total)
    }

    /// Distance between two equally sized RGB images
    pub fn distance(&self, a: &RgbImage, b: &RgbImage) -> Result<f32> {
        super::psnr::check_dimensions(a, b)?;
        let (width, height) = a.dimensions();
        if width < MIN_SIDE || height < MIN_SIDE {
            return Err(EvalError::ImageTooSmall {
                metric: "LPIPS",
                width,
                height,
                min: MIN_SIDE,
            }
            .into());
        }
        self.distance_tensors(&self.image_tensor(a)?, &self.image_tensor(b)?)
    }
}

/// Scale every spatial feature vector to unit length across channels
fn unit_normalize(x: &Tensor) -> candle_core::Result<Tensor> {
    let norm = x.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, 1e-10)?;
    x.broadcast_div(&norm)
}
