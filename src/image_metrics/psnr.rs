// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mean squared error and PSNR over 8-bit RGB images

use crate::error::EvalError;
use image::RgbImage;

/// Reported PSNR for identical images
pub const PSNR_CEILING: f64 = 100.0;

const PIXEL_MAX: f64 = 255.0;

pub(crate) fn check_dimensions(a: &RgbImage, b: &RgbImage) -> Result<(), EvalError> {
    if a.dimensions() != b.dimensions() {
        return Err(EvalError::DimensionMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }
    Ok(())
}

/// Mean squared error over every pixel and channel
pub fn mse(a: &RgbImage, b: &RgbImage) -> Result<f64, EvalError> {
    check_dimensions(a, b)?;

    let samples = a.as_raw().len();
    if samples == 0 {
        return Ok(0.0);
    }

    let sum: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| {
            let d = (*x as i64 - *y as i64).unsigned_abs();
            d * d
        })
        .sum();

    Ok(sum as f64 / samples as f64)
}

/// `20 * log10(255 / sqrt(MSE))`, or [`PSNR_CEILING`] when MSE is zero
pub fn psnr(a: &RgbImage, b: &RgbImage) -> Result<f64, EvalError> {
    let mse = mse(a, b)?;
    if mse == 0.0 {
        return Ok(PSNR_CEILING);
    }
    Ok(20.0 * (PIXEL_MAX / mse.sqrt()).log10())
}
