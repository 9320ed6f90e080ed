// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Structural similarity over 8-bit RGB images
//!
//! Each channel is scored independently with a uniform square window and
//! sample (N - 1) statistics; the per-channel means are then averaged. Only
//! windows lying fully inside the image contribute, which is the same as
//! cropping half a window from every border before taking the mean.

use super::psnr::check_dimensions;
use crate::error::EvalError;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// SSIM constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SsimParams {
    /// Window edge in pixels, odd
    pub window: u32,
    pub k1: f64,
    pub k2: f64,
    pub data_range: f64,
}

impl Default for SsimParams {
    fn default() -> Self {
        Self {
            window: 7,
            k1: 0.01,
            k2: 0.03,
            data_range: 255.0,
        }
    }
}

impl SsimParams {
    pub fn with_window(window: u32) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }
}

/// Summed-area table with a zero first row and column
struct Integral {
    stride: usize,
    sums: Vec<f64>,
}

impl Integral {
    fn new(width: usize, height: usize, value: impl Fn(usize, usize) -> f64) -> Self {
        let stride = width + 1;
        let mut sums = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row = 0.0;
            for x in 0..width {
                row += value(x, y);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row;
            }
        }
        Self { stride, sums }
    }

    /// Sum over `[x0, x1) x [y0, y1)`
    fn window(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
        let s = self.stride;
        self.sums[y1 * s + x1] - self.sums[y0 * s + x1] - self.sums[y1 * s + x0]
            + self.sums[y0 * s + x0]
    }
}

/// Mean SSIM of two images, averaged over the RGB channels
pub fn ssim(a: &RgbImage, b: &RgbImage, params: &SsimParams) -> Result<f64, EvalError> {
    check_dimensions(a, b)?;

    let window = params.window;
    if window < 3 || window % 2 == 0 {
        return Err(EvalError::invalid(
            "ssim_window",
            format!("must be odd and at least 3, got {}", window),
        ));
    }

    let (width, height) = a.dimensions();
    if width < window || height < window {
        return Err(EvalError::ImageTooSmall {
            metric: "SSIM",
            width,
            height,
            min: window,
        });
    }

    let total: f64 = (0..3)
        .map(|channel| channel_ssim(a, b, channel, params))
        .sum();
    Ok(total / 3.0)
}

fn channel_ssim(a: &RgbImage, b: &RgbImage, channel: usize, params: &SsimParams) -> f64 {
    let (w, h) = (a.width() as usize, a.height() as usize);
    let pa = a.as_raw();
    let pb = b.as_raw();
    let at = |x: usize, y: usize, p: &[u8]| p[(y * w + x) * 3 + channel] as f64;

    let sum_a = Integral::new(w, h, |x, y| at(x, y, pa));
    let sum_b = Integral::new(w, h, |x, y| at(x, y, pb));
    let sum_aa = Integral::new(w, h, |x, y| at(x, y, pa).powi(2));
    let sum_bb = Integral::new(w, h, |x, y| at(x, y, pb).powi(2));
    let sum_ab = Integral::new(w, h, |x, y| at(x, y, pa) * at(x, y, pb));

    let win = params.window as usize;
    let n = (win * win) as f64;
    let cov_norm = n / (n - 1.0);
    let c1 = (params.k1 * params.data_range).powi(2);
    let c2 = (params.k2 * params.data_range).powi(2);

    let mut total = 0.0;
    let mut count = 0usize;
    for y0 in 0..=(h - win) {
        for x0 in 0..=(w - win) {
            let (x1, y1) = (x0 + win, y0 + win);
            let ux = sum_a.window(x0, y0, x1, y1) / n;
            let uy = sum_b.window(x0, y0, x1, y1) / n;
            let uxx = sum_aa.window(x0, y0, x1, y1) / n;
            let uyy = sum_bb.window(x0, y0, x1, y1) / n;
            let uxy = sum_ab.window(x0, y0, x1, y1) / n;

            let vx = cov_norm * (uxx - ux * ux);
            let vy = cov_norm * (uyy - uy * uy);
            let vxy = cov_norm * (uxy - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            count += 1;
        }
    }

    total / count as f64
}
